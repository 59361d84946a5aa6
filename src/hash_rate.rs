use super::*;

const SI_PREFIXES: &[(&str, f64)] = &[
    ("", 1.0),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HashRate(pub f64);

impl HashRate {
    pub const ZERO: Self = Self(0.0);
}

impl fmt::Display for HashRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            return write!(f, "0 H/s");
        }

        let (prefix, divisor) = SI_PREFIXES
            .iter()
            .rev()
            .find(|(_, divisor)| self.0.abs() >= *divisor * 0.9999)
            .unwrap_or(&SI_PREFIXES[0]);

        let scaled = self.0 / divisor;

        // Three significant figures.
        if scaled >= 100.0 {
            write!(f, "{scaled:.0} {prefix}H/s")
        } else if scaled >= 10.0 {
            write!(f, "{scaled:.1} {prefix}H/s")
        } else {
            write!(f, "{scaled:.2} {prefix}H/s")
        }
    }
}

impl Serialize for HashRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
