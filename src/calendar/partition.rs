use chrono::{Datelike, NaiveDate, Weekday};

use super::model::{SemesterDay, WeekData};

/// Monday of the ISO week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// Teaching week number of `date`: 0 before the ISO week of
/// `first_teaching_date`, 1 for that week, and so on.
pub fn teaching_week_of(date: NaiveDate, first_teaching_date: NaiveDate) -> u32 {
    let boundary = week_monday(first_teaching_date);
    let monday = week_monday(date);
    if monday < boundary {
        return 0;
    }
    ((monday - boundary).num_days() / 7 + 1) as u32
}

/// Splits an ordered run of days into Monday-started week buckets.
///
/// Buckets whose ISO-week Monday precedes the Monday of `first_teaching_date`
/// form week 0; every later bucket takes the previous index plus one. The
/// concatenation of all buckets equals the input, so the first and last bucket
/// may be partial weeks.
pub fn partition<I>(days: I, first_teaching_date: NaiveDate) -> Vec<WeekData>
where
    I: IntoIterator<Item = SemesterDay>,
{
    let boundary = week_monday(first_teaching_date);
    let mut weeks: Vec<WeekData> = Vec::new();
    let mut bucket: Vec<SemesterDay> = Vec::new();
    let mut week_index: u32 = 0;

    for day in days {
        let opens_week = bucket.is_empty() || day.date.weekday() == Weekday::Mon;
        if opens_week {
            if !bucket.is_empty() {
                weeks.push(WeekData {
                    week_index,
                    days: std::mem::take(&mut bucket),
                });
            }
            week_index = if week_monday(day.date) >= boundary {
                week_index + 1
            } else {
                0
            };
        }
        bucket.push(day);
    }

    if !bucket.is_empty() {
        weeks.push(WeekData {
            week_index,
            days: bucket,
        });
    }

    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::model::DayType;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    fn plain_days(from: &str, to: &str) -> Vec<SemesterDay> {
        let end = d(to);
        d(from)
            .iter_days()
            .take_while(|x| *x <= end)
            .map(|date| SemesterDay {
                date,
                day_type: DayType::Normal,
                topic: String::new(),
                reschedule_info: None,
            })
            .collect()
    }

    #[test]
    fn week_monday_is_iso_monday() {
        assert_eq!(week_monday(d("2025-02-16")), d("2025-02-10"));
        assert_eq!(week_monday(d("2025-02-17")), d("2025-02-17"));
        assert_eq!(week_monday(d("2025-02-19")), d("2025-02-17"));
    }

    #[test]
    fn teaching_week_counts_from_boundary_week() {
        let ft = d("2025-02-19");
        assert_eq!(teaching_week_of(d("2025-02-16"), ft), 0);
        assert_eq!(teaching_week_of(d("2025-02-17"), ft), 1);
        assert_eq!(teaching_week_of(d("2025-02-23"), ft), 1);
        assert_eq!(teaching_week_of(d("2025-02-24"), ft), 2);
        assert_eq!(teaching_week_of(d("2025-05-26"), ft), 15);
    }

    #[test]
    fn empty_input_yields_no_weeks() {
        assert!(partition(Vec::new(), d("2025-02-17")).is_empty());
    }

    #[test]
    fn several_prep_weeks_all_stay_zero() {
        let weeks = partition(plain_days("2025-01-27", "2025-02-23"), d("2025-02-17"));
        let idx: Vec<u32> = weeks.iter().map(|w| w.week_index).collect();
        assert_eq!(idx, vec![0, 0, 0, 1]);
    }

    #[test]
    fn partial_edges_are_kept() {
        // Wednesday start, Tuesday end.
        let weeks = partition(plain_days("2025-02-12", "2025-03-04"), d("2025-02-17"));
        let lens: Vec<usize> = weeks.iter().map(|w| w.days.len()).collect();
        assert_eq!(lens, vec![5, 7, 7, 2]);
        let idx: Vec<u32> = weeks.iter().map(|w| w.week_index).collect();
        assert_eq!(idx, vec![0, 1, 2, 3]);
    }

    #[test]
    fn semester_starting_on_first_teaching_monday_has_no_prep_week() {
        let weeks = partition(plain_days("2025-02-17", "2025-03-02"), d("2025-02-17"));
        let idx: Vec<u32> = weeks.iter().map(|w| w.week_index).collect();
        assert_eq!(idx, vec![1, 2]);
    }

    #[test]
    fn partition_agrees_with_teaching_week_of() {
        let ft = d("2025-02-20");
        let weeks = partition(plain_days("2025-02-05", "2025-04-10"), ft);
        for w in &weeks {
            for day in &w.days {
                assert_eq!(w.week_index, teaching_week_of(day.date, ft), "{}", day.date);
            }
        }
    }
}
