//! 日切计算
//!
//! 每一期开奖归属参考时区中的一个自然日，截止于该时区固定的墙上时间（默认 22:00）。
//! 给定任意时刻，计算:
//! - `close_at`: 当前或下一次截止时刻 (UTC)
//! - `day_bucket`: 拥有该截止时刻的自然日，以 UTC 零点表示

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::DrawConfig;
use crate::error::{AppError, AppResult};

/// 墙上时间 -> UTC 的修正轮数
const CORRECTION_PASSES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawWindow {
    pub close_at: DateTime<Utc>,
    pub day_bucket: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct DayBucketer {
    tz: Tz,
    cutover: NaiveTime,
}

impl DayBucketer {
    pub fn new(tz: Tz, cutover: NaiveTime) -> Self {
        Self { tz, cutover }
    }

    pub fn from_config(config: &DrawConfig) -> AppResult<Self> {
        let tz: Tz = config.timezone.parse().map_err(|e| {
            AppError::ConfigError(format!("invalid draw timezone {}: {e}", config.timezone))
        })?;
        let cutover = NaiveTime::from_hms_opt(config.cutover_hour, config.cutover_minute, 0)
            .ok_or_else(|| {
                AppError::ConfigError(format!(
                    "invalid draw cutover {:02}:{:02}",
                    config.cutover_hour, config.cutover_minute
                ))
            })?;
        Ok(Self::new(tz, cutover))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// 计算 `now` 所在的开奖窗口
    ///
    /// 参考时区当前时间早于截止时间则取今天的截止，否则取明天的。
    /// 所属自然日取截止前一瞬间在参考时区的日期。
    ///
    /// 截止时间落在夏令时跳过的区间时，换算结果可能早于 `now`；
    /// 此时同样顺延到下一天，保证 close_at 总是晚于 `now`。
    pub fn window_for(&self, now: DateTime<Utc>) -> DrawWindow {
        let local = self.wall_clock(now);
        let target_date = if local.time() < self.cutover {
            local.date()
        } else {
            local.date() + Duration::days(1)
        };

        let mut close_at = self.local_to_utc(target_date.and_time(self.cutover));
        if close_at <= now {
            close_at =
                self.local_to_utc((target_date + Duration::days(1)).and_time(self.cutover));
        }
        let owning_date = self.wall_clock(close_at - Duration::nanoseconds(1)).date();

        DrawWindow {
            close_at,
            day_bucket: utc_midnight(owning_date),
        }
    }

    pub fn day_bucket(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.window_for(now).day_bucket
    }

    /// 参考时区墙上时间
    fn wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    /// 参考时区墙上时间 -> UTC
    ///
    /// 先把墙上时间当作 UTC，再反算该时刻在参考时区的墙上时间，按偏差修正。
    /// 最多修正三次；夏令时跳过的时间（不存在的墙上时间）不会收敛，返回第三次修正后的结果。
    pub fn local_to_utc(&self, target: NaiveDateTime) -> DateTime<Utc> {
        let mut guess = Utc.from_utc_datetime(&target);
        for _ in 0..CORRECTION_PASSES {
            let drift = self.wall_clock(guess) - target;
            if drift == Duration::zero() {
                break;
            }
            guess = guess - drift;
        }
        guess
    }
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris_22() -> DayBucketer {
        DayBucketer::new(
            chrono_tz::Europe::Paris,
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        )
    }

    fn paris(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        chrono_tz::Europe::Paris
            .with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_one_minute_before_cutover() {
        let w = paris_22().window_for(paris(2025, 6, 10, 21, 59, 0));
        assert_eq!(w.close_at, paris(2025, 6, 10, 22, 0, 0));
        // 夏令时 CEST = UTC+2
        assert_eq!(w.close_at, utc(2025, 6, 10, 20, 0, 0));
        assert_eq!(w.day_bucket, utc(2025, 6, 10, 0, 0, 0));
    }

    #[test]
    fn test_just_after_cutover_moves_to_next_day() {
        let w = paris_22().window_for(paris(2025, 6, 10, 22, 0, 1));
        assert_eq!(w.close_at, paris(2025, 6, 11, 22, 0, 0));
        assert_eq!(w.day_bucket, utc(2025, 6, 11, 0, 0, 0));
    }

    #[test]
    fn test_exactly_at_cutover_belongs_to_next_day() {
        let w = paris_22().window_for(paris(2025, 6, 10, 22, 0, 0));
        assert_eq!(w.day_bucket, utc(2025, 6, 11, 0, 0, 0));
    }

    #[test]
    fn test_same_bucket_for_whole_day_before_cutover() {
        let b = paris_22();
        let expected = utc(2025, 6, 10, 0, 0, 0);
        for t in [
            paris(2025, 6, 10, 0, 0, 0),
            paris(2025, 6, 10, 6, 30, 0),
            paris(2025, 6, 10, 12, 0, 0),
            paris(2025, 6, 10, 21, 59, 59),
        ] {
            assert_eq!(b.day_bucket(t), expected, "at {t}");
        }
        // 前一天日切之后同样属于 6/10
        assert_eq!(b.day_bucket(paris(2025, 6, 9, 23, 0, 0)), expected);
    }

    #[test]
    fn test_crossing_cutover_advances_one_day() {
        let b = paris_22();
        let before = b.day_bucket(paris(2025, 6, 10, 21, 59, 59));
        let after = b.day_bucket(paris(2025, 6, 10, 22, 0, 0));
        assert_eq!(after - before, Duration::days(1));
    }

    #[test]
    fn test_close_time_follows_dst_switch() {
        let b = paris_22();
        // 2025-03-30 凌晨切换夏令时，前一天 CET (+1)，当天 CEST (+2)
        let sat = b.window_for(paris(2025, 3, 29, 12, 0, 0));
        assert_eq!(sat.close_at, utc(2025, 3, 29, 21, 0, 0));
        assert_eq!(sat.day_bucket, utc(2025, 3, 29, 0, 0, 0));

        let sun = b.window_for(paris(2025, 3, 30, 12, 0, 0));
        assert_eq!(sun.close_at, utc(2025, 3, 30, 20, 0, 0));
        assert_eq!(sun.day_bucket, utc(2025, 3, 30, 0, 0, 0));

        // 10-26 切回冬令时
        let oct = b.window_for(paris(2025, 10, 26, 12, 0, 0));
        assert_eq!(oct.close_at, utc(2025, 10, 26, 21, 0, 0));
    }

    #[test]
    fn test_window_spanning_dst_switch_is_23_hours() {
        let b = paris_22();
        // 3/29 22:00 之后的窗口截止于 3/30 22:00，中间只有 23 小时
        let w = b.window_for(paris(2025, 3, 29, 22, 30, 0));
        assert_eq!(w.day_bucket, utc(2025, 3, 30, 0, 0, 0));
        assert_eq!(
            w.close_at - paris(2025, 3, 29, 22, 0, 0),
            Duration::hours(23)
        );
    }

    #[test]
    fn test_nonexistent_wall_time_returns_third_pass() {
        // 02:30 在 2025-03-30 的巴黎不存在 (02:00 -> 03:00)
        let b = DayBucketer::new(
            chrono_tz::Europe::Paris,
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
        );
        let target = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        // 02:30Z -> 00:30Z -> 01:30Z -> 00:30Z，三次后停在 00:30Z (当地 01:30 CET)
        assert_eq!(b.local_to_utc(target), utc(2025, 3, 30, 0, 30, 0));
    }

    #[test]
    fn test_cutover_inside_dst_gap_never_closes_in_the_past() {
        let b = DayBucketer::new(
            chrono_tz::Europe::Paris,
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
        );

        // 当地 00:45 CET：换算出的截止 00:30Z 仍在将来
        let early = b.window_for(utc(2025, 3, 29, 23, 45, 0));
        assert_eq!(early.close_at, utc(2025, 3, 30, 0, 30, 0));
        assert_eq!(early.day_bucket, utc(2025, 3, 30, 0, 0, 0));

        // 当地 01:45 CET：00:30Z 已过，顺延到 3/31 02:30 CEST
        let now = utc(2025, 3, 30, 0, 45, 0);
        let w = b.window_for(now);
        assert!(w.close_at > now);
        assert_eq!(w.close_at, utc(2025, 3, 31, 0, 30, 0));
        assert_eq!(w.day_bucket, utc(2025, 3, 31, 0, 0, 0));
    }

    #[test]
    fn test_ambiguous_wall_time_picks_later_instant() {
        // 02:30 在 2025-10-26 的巴黎出现两次
        let b = DayBucketer::new(
            chrono_tz::Europe::Paris,
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
        );
        let target = NaiveDate::from_ymd_opt(2025, 10, 26)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(b.local_to_utc(target), utc(2025, 10, 26, 1, 30, 0));
    }

    #[test]
    fn test_from_config_rejects_bad_values() {
        let mut cfg = DrawConfig::default();
        assert!(DayBucketer::from_config(&cfg).is_ok());

        cfg.timezone = "Mars/Olympus".into();
        assert!(DayBucketer::from_config(&cfg).is_err());

        let mut cfg = DrawConfig::default();
        cfg.cutover_hour = 24;
        assert!(DayBucketer::from_config(&cfg).is_err());
    }

    #[test]
    fn test_utc_reference_zone() {
        let b = DayBucketer::new(chrono_tz::UTC, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let w = b.window_for(utc(2025, 1, 1, 15, 0, 0));
        assert_eq!(w.close_at, utc(2025, 1, 2, 0, 0, 0));
        assert_eq!(w.day_bucket, utc(2025, 1, 1, 0, 0, 0));
    }
}
