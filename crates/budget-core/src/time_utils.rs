use chrono::{Datelike, NaiveDate};

use crate::error::{BudgetError, Result};

// ── Month tokens ──────────────────────────────────────────────────────────────

/// Map a two-digit month token (`"01"`..`"12"`) to its month number.
///
/// Single digits, `"00"`, `"13"` and anything non-numeric yield `None`.
pub fn month_from_token(token: &str) -> Option<u32> {
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

// ── Fiscal dates ──────────────────────────────────────────────────────────────

/// Parse a fiscal year given as a four-digit string.
pub fn parse_fiscal_year(year: &str) -> Result<i32> {
    let trimmed = year.trim();
    if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BudgetError::InvalidFiscalYear(year.to_string()));
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| BudgetError::InvalidFiscalYear(year.to_string()))
}

/// First day of `month` in `year`.
pub fn period_date(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(BudgetError::InvalidMonth(month))
}

/// Render a period date as `YYYY-MM-01`.
pub fn format_period_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-01", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_from_token_valid() {
        assert_eq!(month_from_token("01"), Some(1));
        assert_eq!(month_from_token("09"), Some(9));
        assert_eq!(month_from_token("12"), Some(12));
    }

    #[test]
    fn test_month_from_token_invalid() {
        assert_eq!(month_from_token("1"), None);
        assert_eq!(month_from_token("00"), None);
        assert_eq!(month_from_token("13"), None);
        assert_eq!(month_from_token("ab"), None);
        assert_eq!(month_from_token("+1"), None);
        assert_eq!(month_from_token(""), None);
    }

    #[test]
    fn test_parse_fiscal_year() {
        assert_eq!(parse_fiscal_year("2022").unwrap(), 2022);
        assert_eq!(parse_fiscal_year(" 2023 ").unwrap(), 2023);
    }

    #[test]
    fn test_parse_fiscal_year_rejects_garbage() {
        assert!(parse_fiscal_year("22").is_err());
        assert!(parse_fiscal_year("20x2").is_err());
        assert!(parse_fiscal_year("").is_err());
    }

    #[test]
    fn test_format_period_date() {
        let date = period_date(2022, 3).unwrap();
        assert_eq!(format_period_date(date), "2022-03-01");
    }

    #[test]
    fn test_period_date_rejects_month_13() {
        assert!(matches!(period_date(2022, 13), Err(BudgetError::InvalidMonth(13))));
        assert!(matches!(period_date(2022, 0), Err(BudgetError::InvalidMonth(0))));
    }
}
