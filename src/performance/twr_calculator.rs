use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::constants::DECIMAL_PRECISION;

use super::performance_model::TwrDailyRow;

/// Counters from one computation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TwrComputationStats {
    pub rows_computed: usize,
    /// Rows where `start_nav + cash_flow` was zero. HP is forced to 0 for
    /// them; the count lets callers surface the likely data-quality issue.
    pub zero_denominators: usize,
}

/// Recomputes HP and cumulative TWR over the window on or after `cutoff`.
///
/// The fold is strictly sequential per account: each row's holding-period
/// return depends on the previous row's NAV. Rows are sorted by date first
/// rather than trusting input order; a wrong order would silently corrupt
/// the cumulative multiplier. Rows before the cutoff are left untouched.
///
/// For row i with previous window row i-1:
/// `denominator = nav[i-1] + cash_flow[i]`,
/// `HP[i] = (nav[i] - denominator) / denominator` (0 when the denominator
/// is zero), `TWR[i] = prod(1 + HP) - 1`. The first window row has no
/// previous NAV, so its HP is null and its TWR is 0.
///
/// Re-running with the same inputs and cutoff reproduces identical values.
pub fn compute_returns(
    rows: &mut [TwrDailyRow],
    cutoff: Option<NaiveDate>,
) -> TwrComputationStats {
    let mut stats = TwrComputationStats::default();

    rows.sort_by_key(|row| row.row_date);
    let Some(first_date) = rows.first().map(|row| row.row_date) else {
        return stats;
    };
    let cutoff = cutoff.unwrap_or(first_date);

    let mut multiplier = Decimal::ONE;
    let mut previous_nav: Option<Decimal> = None;
    for row in rows.iter_mut() {
        if row.row_date < cutoff {
            continue;
        }
        match previous_nav {
            None => {
                row.hp_return = None;
                row.twr = Some(Decimal::ZERO);
            }
            Some(start_nav) => {
                let denominator = start_nav + row.cash_flow;
                let hp = if denominator.is_zero() {
                    stats.zero_denominators += 1;
                    Decimal::ZERO
                } else {
                    (row.nav - denominator) / denominator
                };
                multiplier *= Decimal::ONE + hp;
                row.hp_return = Some(hp.round_dp(DECIMAL_PRECISION));
                row.twr = Some((multiplier - Decimal::ONE).round_dp(DECIMAL_PRECISION));
            }
        }
        row.cutoff_date = Some(cutoff);
        previous_nav = Some(row.nav);
        stats.rows_computed += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(date: (i32, u32, u32), nav: Decimal, cash_flow: Decimal) -> TwrDailyRow {
        let mut row = TwrDailyRow::new(
            "acc-1",
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            nav,
        );
        row.cash_flow = cash_flow;
        row
    }

    #[test]
    fn empty_window_is_a_no_op() {
        let mut rows: Vec<TwrDailyRow> = Vec::new();
        let stats = compute_returns(&mut rows, None);
        assert_eq!(stats, TwrComputationStats::default());
    }

    #[test]
    fn first_row_has_null_hp_and_zero_twr() {
        let mut rows = vec![row((2024, 1, 1), dec!(100), dec!(0))];
        compute_returns(&mut rows, None);

        assert_eq!(rows[0].hp_return, None);
        assert_eq!(rows[0].twr, Some(dec!(0)));
    }

    #[test]
    fn no_cash_flows_compound_to_nav_ratio() {
        let mut rows = vec![
            row((2024, 1, 1), dec!(100), dec!(0)),
            row((2024, 1, 2), dec!(104), dec!(0)),
            row((2024, 1, 3), dec!(130), dec!(0)),
        ];
        compute_returns(&mut rows, None);

        // (130 / 100) - 1
        assert_eq!(rows[2].twr, Some(dec!(0.3)));
    }

    #[test]
    fn deposit_fully_explaining_a_nav_rise_yields_zero_return() {
        let mut rows = vec![
            row((2024, 1, 1), dec!(100), dec!(0)),
            row((2024, 1, 2), dec!(100), dec!(0)),
            row((2024, 1, 3), dec!(110), dec!(10)),
        ];
        compute_returns(&mut rows, None);

        assert_eq!(rows[1].hp_return, Some(dec!(0)));
        assert_eq!(rows[2].hp_return, Some(dec!(0)));
        assert_eq!(rows[2].twr, Some(dec!(0)));
    }

    #[test]
    fn zero_denominator_forces_hp_to_zero_and_is_counted() {
        let mut rows = vec![
            row((2024, 1, 1), dec!(100), dec!(0)),
            row((2024, 1, 2), dec!(50), dec!(-100)),
            row((2024, 1, 3), dec!(55), dec!(0)),
        ];
        let stats = compute_returns(&mut rows, None);

        assert_eq!(rows[1].hp_return, Some(dec!(0)));
        assert_eq!(stats.zero_denominators, 1);
        // The fold keeps going: 55/50 - 1.
        assert_eq!(rows[2].hp_return, Some(dec!(0.1)));
        assert_eq!(rows[2].twr, Some(dec!(0.1)));
    }

    #[test]
    fn rows_are_sorted_before_folding() {
        let mut shuffled = vec![
            row((2024, 1, 3), dec!(130), dec!(0)),
            row((2024, 1, 1), dec!(100), dec!(0)),
            row((2024, 1, 2), dec!(104), dec!(0)),
        ];
        compute_returns(&mut shuffled, None);

        assert_eq!(shuffled[0].row_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(shuffled[2].twr, Some(dec!(0.3)));
    }

    #[test]
    fn recalculation_is_idempotent() {
        let mut rows = vec![
            row((2024, 1, 1), dec!(100), dec!(0)),
            row((2024, 1, 2), dec!(108), dec!(5)),
            row((2024, 1, 3), dec!(112), dec!(-2)),
        ];
        compute_returns(&mut rows, None);
        let first_pass: Vec<_> = rows.iter().map(|r| (r.hp_return, r.twr)).collect();

        compute_returns(&mut rows, None);
        let second_pass: Vec<_> = rows.iter().map(|r| (r.hp_return, r.twr)).collect();

        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn cutoff_restarts_the_window_and_spares_earlier_rows() {
        let mut rows = vec![
            row((2024, 1, 1), dec!(100), dec!(0)),
            row((2024, 1, 2), dec!(110), dec!(0)),
            row((2024, 1, 3), dec!(121), dec!(0)),
            row((2024, 1, 4), dec!(133.1), dec!(0)),
        ];
        compute_returns(&mut rows, None);
        let pre_cutoff: Vec<_> = rows[..2].iter().map(|r| (r.hp_return, r.twr)).collect();

        let cutoff = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let stats = compute_returns(&mut rows, Some(cutoff));

        // Earlier rows keep their previous values.
        let unchanged: Vec<_> = rows[..2].iter().map(|r| (r.hp_return, r.twr)).collect();
        assert_eq!(pre_cutoff, unchanged);

        // The window restarts at the cutoff row.
        assert_eq!(stats.rows_computed, 2);
        assert_eq!(rows[2].hp_return, None);
        assert_eq!(rows[2].twr, Some(dec!(0)));
        assert_eq!(rows[3].hp_return, Some(dec!(0.1)));
        assert_eq!(rows[3].twr, Some(dec!(0.1)));
        assert_eq!(rows[3].cutoff_date, Some(cutoff));
    }
}
