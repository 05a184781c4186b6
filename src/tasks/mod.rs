//! 进程内触发器
//!
//! 默认关闭，生产环境由外部定时器调用 `/api/v1/cron/cycle`。
//! 开启后与外部触发并存也是安全的：每一步都有认领保护。

use crate::services::OrchestrationService;
use chrono::Utc;

/// 启动后台任务；interval_secs 为 0 时不启动
pub fn spawn_all(orchestration: OrchestrationService, interval_secs: u64) {
    if interval_secs == 0 {
        log::info!("In-process scheduler disabled, waiting for external triggers");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            let summary = orchestration.run_cycle(Utc::now()).await;
            log::debug!("Scheduled cycle {} finished", summary.run_id);
        }
    });
    log::info!("In-process scheduler started (every {interval_secs}s)");
}
