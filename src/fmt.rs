/// Group an integer's digits in threes: 1234567 -> "1,234,567".
pub fn number(val: i64) -> String {
    let digits = val.unsigned_abs().to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();
    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

/// Format a yen amount: ¥1,234
pub fn yen(val: i64) -> String {
    if val < 0 {
        format!("-¥{}", number(-val))
    } else {
        format!("¥{}", number(val))
    }
}

/// Compact axis label: ¥950, ¥12k, ¥1.5M
pub fn yen_compact(val: i64) -> String {
    let v = val as f64;
    if v >= 1_000_000.0 {
        let m = v / 1_000_000.0;
        if m == m.floor() {
            format!("¥{}M", m as i64)
        } else {
            format!("¥{:.1}M", m)
        }
    } else if v >= 1000.0 {
        let k = v / 1000.0;
        if k == k.floor() {
            format!("¥{}k", k as i64)
        } else {
            format!("¥{:.1}k", k)
        }
    } else {
        format!("¥{val}")
    }
}

pub fn occasions(count: usize) -> String {
    if count == 1 {
        "1 purchase".to_string()
    } else {
        format!("{} purchases", number(count as i64))
    }
}

pub const MONTH_NAMES: &[&str] = &[
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("???")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yen_formatting() {
        assert_eq!(yen(1234), "¥1,234");
        assert_eq!(yen(-500), "-¥500");
        assert_eq!(yen(0), "¥0");
        assert_eq!(yen(1_000_000), "¥1,000,000");
        assert_eq!(number(999), "999");
    }

    #[test]
    fn test_yen_compact() {
        assert_eq!(yen_compact(950), "¥950");
        assert_eq!(yen_compact(12_000), "¥12k");
        assert_eq!(yen_compact(2_500), "¥2.5k");
        assert_eq!(yen_compact(1_500_000), "¥1.5M");
    }

    #[test]
    fn test_labels() {
        assert_eq!(occasions(1), "1 purchase");
        assert_eq!(occasions(1200), "1,200 purchases");
        assert_eq!(month_name(9), "September");
        assert_eq!(month_name(0), "???");
        assert_eq!(month_name(13), "???");
    }
}
