use chrono::{NaiveDate, NaiveDateTime};

use super::*;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

#[test]
fn test_daily_stamp_is_run_unique() {
    let a = Tier::Daily.stamp(at(2025, 3, 14, 9, 26, 53));
    let b = Tier::Daily.stamp(at(2025, 3, 14, 9, 26, 54));
    assert_eq!(a, "2025-03-14_09-26-53");
    assert_ne!(a, b);
}

#[test]
fn test_weekly_stamp_uses_iso_week() {
    assert_eq!(Tier::Weekly.stamp(at(2025, 2, 12, 0, 0, 0)), "2025-W07");
    // Week numbers are zero-padded.
    assert_eq!(Tier::Weekly.stamp(at(2025, 1, 6, 12, 0, 0)), "2025-W02");
}

#[test]
fn test_weekly_stamp_iso_year_boundary() {
    // 2027-01-01 is a Friday, which ISO places in week 53 of 2026.
    assert_eq!(Tier::Weekly.stamp(at(2027, 1, 1, 8, 0, 0)), "2026-W53");
}

#[test]
fn test_monthly_and_yearly_stamps() {
    let when = at(2025, 7, 31, 23, 59, 59);
    assert_eq!(Tier::Monthly.stamp(when), "2025-07");
    assert_eq!(Tier::Yearly.stamp(when), "2025");
}

#[test]
fn test_period_stamps_collide_within_period() {
    // Two runs in the same week/month/year map to the same name, so the
    // archiver's overwrite semantics keep one snapshot per period.
    let mon = at(2025, 2, 10, 2, 0, 0);
    let fri = at(2025, 2, 14, 22, 0, 0);
    assert_eq!(Tier::Weekly.stamp(mon), Tier::Weekly.stamp(fri));
    assert_eq!(Tier::Monthly.stamp(mon), Tier::Monthly.stamp(fri));
    assert_eq!(Tier::Yearly.stamp(mon), Tier::Yearly.stamp(fri));
    assert_ne!(Tier::Daily.stamp(mon), Tier::Daily.stamp(fri));
}

#[test]
fn test_archive_file_name() {
    let when = at(2025, 1, 1, 0, 0, 0);
    assert_eq!(
        Tier::Yearly.archive_file_name("meshtracking", when),
        "meshtracking_yearly_2025.tar.gz"
    );
    assert_eq!(
        Tier::Daily.archive_file_name("meshtracking", when),
        "meshtracking_daily_2025-01-01_00-00-00.tar.gz"
    );
}

#[test]
fn test_tier_from_str() {
    assert_eq!("daily".parse::<Tier>().unwrap(), Tier::Daily);
    assert_eq!("yearly".parse::<Tier>().unwrap(), Tier::Yearly);

    let err = "hourly".parse::<Tier>().unwrap_err();
    assert!(matches!(err, BackupError::InvalidTier(ref s) if s == "hourly"));
}

#[test]
fn test_default_keep_counts() {
    assert_eq!(Tier::Daily.default_keep(), 10);
    assert_eq!(Tier::Weekly.default_keep(), 5);
    assert_eq!(Tier::Monthly.default_keep(), 5);
    assert_eq!(Tier::Yearly.default_keep(), 5);
}
