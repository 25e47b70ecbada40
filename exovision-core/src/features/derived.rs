//! Engineered features computed from the base KOI measurements.

/// Guard added before logs and divisions by transit depth.
const EPSILON: f64 = 1e-10;

/// Upper edges of the stellar class bins, each `(lower, upper]`, coolest first (M K G F A B).
const STAR_TYPE_EDGES: [f64; 7] = [0.0, 4000.0, 5000.0, 6000.0, 7000.0, 8000.0, 10000.0];

/// A feature derived from one or more base fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedFeature {
    TransitDepthLog,
    PeriodLog,
    DurationHours,
    TransitSpeed,
    PeriodDurationRatio,
    StarTypeEncoded,
    SnrDepthRatio,
    TransitQuality,
}

impl DerivedFeature {
    pub const ALL: [DerivedFeature; 8] = [
        Self::TransitDepthLog,
        Self::PeriodLog,
        Self::DurationHours,
        Self::TransitSpeed,
        Self::PeriodDurationRatio,
        Self::StarTypeEncoded,
        Self::SnrDepthRatio,
        Self::TransitQuality,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TransitDepthLog => "transit_depth_log",
            Self::PeriodLog => "period_log",
            Self::DurationHours => "duration_hours",
            Self::TransitSpeed => "transit_speed",
            Self::PeriodDurationRatio => "period_duration_ratio",
            Self::StarTypeEncoded => "star_type_encoded",
            Self::SnrDepthRatio => "snr_depth_ratio",
            Self::TransitQuality => "transit_quality",
        }
    }

    /// Compute the feature from resolved base values.
    ///
    /// The result may be non-finite; callers substitute the feature default.
    pub fn compute(&self, base: impl Fn(&str) -> f64) -> f64 {
        match self {
            Self::TransitDepthLog => (base("koi_depth") + EPSILON).log10(),
            Self::PeriodLog => (base("koi_period") + EPSILON).log10(),
            Self::DurationHours => base("koi_duration") * 24.0,
            Self::TransitSpeed => base("koi_depth") / base("koi_duration"),
            Self::PeriodDurationRatio => base("koi_period") / base("koi_duration"),
            Self::StarTypeEncoded => star_type_code(base("koi_steff")),
            Self::SnrDepthRatio => base("koi_model_snr") / (base("koi_depth") + EPSILON),
            Self::TransitQuality => base("koi_model_snr") * base("koi_depth"),
        }
    }
}

/// Stellar class code for an effective temperature, `-1` outside every bin.
pub fn star_type_code(steff: f64) -> f64 {
    STAR_TYPE_EDGES
        .windows(2)
        .position(|edge| steff > edge[0] && steff <= edge[1])
        .map(|idx| idx as f64)
        .unwrap_or(-1.0)
}
