use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if (0. ..=100.).contains(&value) {
            Some(Percentage(value))
        } else {
            None
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Converts a fraction into a percentage, clamping it into `[0, 1]` first.
pub fn fraction_percentage(fraction: f64) -> Percentage {
    let fraction = if fraction.is_nan() { 0. } else { fraction.clamp(0., 1.) };
    Percentage::new_opt(fraction * 100.).expect("Clamped fraction is always a percentage")
}
