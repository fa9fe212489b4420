use chrono::NaiveDateTime;

use crate::Cron;

/// Successive matching times of a [`Cron`], each strictly after the previous one.
///
/// Created by [`Cron::iter_after`]. The iterator ends when the search horizon is
/// exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CronIterator {
    cron: Cron,
    current_time: NaiveDateTime,
}

impl CronIterator {
    /// Creates a new `CronIterator` yielding matches after `start_after`.
    pub fn new(cron: Cron, start_after: NaiveDateTime) -> Self {
        CronIterator {
            cron,
            current_time: start_after,
        }
    }
}

impl Iterator for CronIterator {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let found_time = self.cron.find_next_occurrence(&self.current_time)?;
        self.current_time = found_time;
        Some(found_time)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{CronError, Dialect};

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_iterator_quarterly() -> Result<(), CronError> {
        let cron = Cron::parse("0 30 23 30 1/3 ?", &Dialect::quartz())?;
        let times: Vec<NaiveDateTime> = cron.iter_after(at(2010, 12, 30, 0, 0, 0)).take(3).collect();
        assert_eq!(
            times,
            [
                at(2011, 1, 30, 23, 30, 0),
                at(2011, 4, 30, 23, 30, 0),
                at(2011, 7, 30, 23, 30, 0),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_iterator_is_strictly_increasing() -> Result<(), CronError> {
        let cron = Cron::parse("*/20 */7 1-4 * * *", &Dialect::quartz())?;
        let times: Vec<NaiveDateTime> = cron.iter_after(at(2024, 2, 28, 3, 59, 59)).take(50).collect();
        assert_eq!(times.len(), 50);
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(times.iter().all(|time| cron.is_time_matching(time)));
        Ok(())
    }

    #[test]
    fn test_iterator_ends_with_year_field() -> Result<(), CronError> {
        let cron = Cron::parse("0 0 0 1 1 ? 2020-2022", &Dialect::quartz())?;
        let times: Vec<NaiveDateTime> = cron.iter_after(at(2019, 6, 1, 0, 0, 0)).collect();
        assert_eq!(
            times,
            [
                at(2020, 1, 1, 0, 0, 0),
                at(2021, 1, 1, 0, 0, 0),
                at(2022, 1, 1, 0, 0, 0),
            ]
        );
        Ok(())
    }
}
