//! Constraint profiles tried, in order, when opening the camera.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FacingMode {
    /// Rear camera.
    Environment,
    /// Front camera.
    User,
    #[default]
    Any,
}

impl FacingMode {
    /// Whether a camera facing `actual` satisfies this requirement.
    pub fn accepts(self, actual: FacingMode) -> bool {
        self == FacingMode::Any || self == actual
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
            FacingMode::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(self, max: Resolution) -> bool {
        self.width <= max.width && self.height <= max.height
    }

    /// Relative distance per axis, summed; 0 is a perfect match.
    fn fitness_distance(self, ideal: Resolution) -> f64 {
        fn axis(a: u32, b: u32) -> f64 {
            let hi = a.max(b);
            if hi == 0 {
                0.0
            } else {
                f64::from(a.abs_diff(b)) / f64::from(hi)
            }
        }
        axis(self.width, ideal.width) + axis(self.height, ideal.height)
    }

    fn pixels(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// One acquisition attempt: which camera and what resolution bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintProfile {
    pub name: String,
    #[serde(default)]
    pub facing: FacingMode,
    #[serde(default)]
    pub ideal: Option<Resolution>,
    #[serde(default)]
    pub max: Option<Resolution>,
}

impl ConstraintProfile {
    pub fn environment_hd() -> Self {
        Self {
            name: "environment-hd".into(),
            facing: FacingMode::Environment,
            ideal: Some(Resolution::new(1280, 720)),
            max: Some(Resolution::new(1920, 1080)),
        }
    }

    pub fn environment_sd() -> Self {
        Self {
            name: "environment-sd".into(),
            facing: FacingMode::Environment,
            ideal: Some(Resolution::new(640, 480)),
            max: Some(Resolution::new(1280, 720)),
        }
    }

    pub fn any() -> Self {
        Self {
            name: "any".into(),
            facing: FacingMode::Any,
            ideal: None,
            max: None,
        }
    }

    /// Picks the mode this profile would get from a camera offering `modes`:
    /// within `max`, closest to `ideal`, otherwise the largest.  `None` means
    /// the profile is overconstrained for that camera.
    pub fn select_mode(&self, modes: &[Resolution]) -> Option<Resolution> {
        let eligible = modes
            .iter()
            .copied()
            .filter(|m| self.max.map_or(true, |max| m.fits_within(max)));
        match self.ideal {
            Some(ideal) => eligible.min_by(|a, b| {
                a.fitness_distance(ideal)
                    .total_cmp(&b.fitness_distance(ideal))
                    .then(b.pixels().cmp(&a.pixels()))
            }),
            None => eligible.max_by_key(|m| m.pixels()),
        }
    }
}

/// Ordered fallback list, most specific first.  Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePolicy {
    profiles: Vec<ConstraintProfile>,
}

impl CapturePolicy {
    /// An empty list falls back to the built-in profiles.
    pub fn new(profiles: Vec<ConstraintProfile>) -> Self {
        if profiles.is_empty() {
            log::warn!("empty capture profile list; using the built-in profiles");
            return Self::default();
        }
        Self { profiles }
    }

    pub fn profiles(&self) -> &[ConstraintProfile] {
        &self.profiles
    }
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            profiles: vec![
                ConstraintProfile::environment_hd(),
                ConstraintProfile::environment_sd(),
                ConstraintProfile::any(),
            ],
        }
    }
}
