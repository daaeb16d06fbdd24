use std::fmt;
use std::fmt::Formatter;
use crate::errors::AdviceError;

/// UV exposure severity tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdviceBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for AdviceBand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Text color to use on top of a band color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextContrast {
    Dark,
    Light,
}

impl TextContrast {
    pub fn css(&self) -> &'static str {
        match self {
            TextContrast::Dark => "black",
            TextContrast::Light => "white",
        }
    }
}

/// Color token of a band
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub hex: &'static str,
    pub contrast: TextContrast,
}

/// Outcome of a classification
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advice {
    pub band: AdviceBand,
    pub label: &'static str,
    pub color: Color,
}

impl AdviceBand {
    /// Category name without range or advice
    pub fn name(&self) -> &'static str {
        match self {
            AdviceBand::Low => "Low",
            AdviceBand::Moderate => "Moderate",
            AdviceBand::High => "High",
            AdviceBand::VeryHigh => "Very High",
            AdviceBand::Extreme => "Extreme",
        }
    }

    /// Full advisory sentence for the band
    pub fn label(&self) -> &'static str {
        match self {
            AdviceBand::Low => "Low (0-2): No protection needed. You can safely enjoy the outdoors.",
            AdviceBand::Moderate => "Moderate (3-5): Wear sunglasses on bright days. If you burn easily, cover up and use broad spectrum SPF 30+ sunscreen. Seek shade during midday hours.",
            AdviceBand::High => "High (6-7): Protection needed. Reduce time in the sun between 10 a.m. and 4 p.m. Wear sunglasses, apply SPF 30+ sunscreen every 2 hours, wear a wide-brimmed hat, and cover up with clothing. Seek shade.",
            AdviceBand::VeryHigh => "Very High (8-10): Extra protection needed. Avoid sun exposure between 10 a.m. and 4 p.m. Wear sunglasses, apply SPF 30+ sunscreen every 2 hours, wear a wide-brimmed hat, and protective clothing. Seek shade.",
            AdviceBand::Extreme => "Extreme (11+): Take all precautions. Avoid sun exposure between 10 a.m. and 4 p.m. Wear sunglasses, apply SPF 30+ sunscreen every 2 hours, wear a wide-brimmed hat, and protective clothing. Seek shade.",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            AdviceBand::Low => Color { hex: "#4eb400", contrast: TextContrast::Dark },
            AdviceBand::Moderate => Color { hex: "#f7e400", contrast: TextContrast::Dark },
            AdviceBand::High => Color { hex: "#f8b600", contrast: TextContrast::Dark },
            AdviceBand::VeryHigh => Color { hex: "#d8001d", contrast: TextContrast::Light },
            AdviceBand::Extreme => Color { hex: "#b54cff", contrast: TextContrast::Light },
        }
    }
}

/// Classifies a UV index into its advisory band.
///
/// Upper bounds are inclusive, so 2, 5, 7 and 10 all belong to the lower of the two
/// neighbouring bands. Negative and non-finite values are rejected rather than clamped.
///
/// # Arguments
///
/// * 'index' - the UV index to classify
pub fn classify(index: f64) -> Result<Advice, AdviceError> {
    if !index.is_finite() || index < 0.0 {
        return Err(AdviceError::InvalidIndex(index));
    }

    let band = if index <= 2.0 {
        AdviceBand::Low
    } else if index <= 5.0 {
        AdviceBand::Moderate
    } else if index <= 7.0 {
        AdviceBand::High
    } else if index <= 10.0 {
        AdviceBand::VeryHigh
    } else {
        AdviceBand::Extreme
    };

    Ok(Advice { band, label: band.label(), color: band.color() })
}
