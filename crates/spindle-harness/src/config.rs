//! Soak profile configuration.
//!
//! A profile chooses how hard the runner pushes the thread and TLS
//! primitives. It comes from the CLI's `--profile` flag or the
//! `SPINDLE_SOAK_PROFILE` environment variable; individual knobs can then
//! be overridden per run.

/// Workload depth for a soak run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SoakProfile {
    /// A few hundred spawns; suitable for pre-commit checks.
    Quick,
    /// CI depth.
    #[default]
    Standard,
    /// Long-haul depth for release qualification.
    Extended,
}

impl SoakProfile {
    /// Parse a profile name. Matching is case-insensitive and accepts a few
    /// aliases; unrecognized input falls back to the default.
    #[must_use]
    pub fn from_str_loose(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "quick" | "fast" | "smoke" => Self::Quick,
            "extended" | "long" | "release" => Self::Extended,
            _ => Self::Standard,
        }
    }

    /// Read the profile from `SPINDLE_SOAK_PROFILE`. Absent or unrecognized
    /// values select the default.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("SPINDLE_SOAK_PROFILE")
            .map(|raw| Self::from_str_loose(&raw))
            .unwrap_or_default()
    }

    /// Workload parameters for this profile.
    #[must_use]
    pub const fn params(self) -> SoakParams {
        match self {
            Self::Quick => SoakParams {
                workers: 4,
                cycles: 8,
                tls_rounds: 64,
            },
            Self::Standard => SoakParams {
                workers: 8,
                cycles: 32,
                tls_rounds: 256,
            },
            Self::Extended => SoakParams {
                workers: 16,
                cycles: 256,
                tls_rounds: 1024,
            },
        }
    }

    /// Name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

/// Workload knobs derived from a profile. Each one can be overridden from
/// the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoakParams {
    /// Concurrent workers per cycle.
    pub workers: u32,
    /// Spawn/join cycles per case.
    pub cycles: u64,
    /// Read-back iterations per worker in the TLS isolation case.
    pub tls_rounds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_names_parse_loosely() {
        assert_eq!(SoakProfile::from_str_loose("quick"), SoakProfile::Quick);
        assert_eq!(SoakProfile::from_str_loose("QUICK"), SoakProfile::Quick);
        assert_eq!(SoakProfile::from_str_loose("smoke"), SoakProfile::Quick);
        assert_eq!(
            SoakProfile::from_str_loose("standard"),
            SoakProfile::Standard
        );
        assert_eq!(SoakProfile::from_str_loose("long"), SoakProfile::Extended);
        assert_eq!(
            SoakProfile::from_str_loose("release"),
            SoakProfile::Extended
        );
    }

    #[test]
    fn unknown_profiles_fall_back_to_standard() {
        assert_eq!(
            SoakProfile::from_str_loose("warp-speed"),
            SoakProfile::Standard
        );
        assert_eq!(SoakProfile::from_str_loose(""), SoakProfile::Standard);
    }

    #[test]
    fn deeper_profiles_do_more_work() {
        let quick = SoakProfile::Quick.params();
        let standard = SoakProfile::Standard.params();
        let extended = SoakProfile::Extended.params();

        assert!(quick.workers < standard.workers);
        assert!(standard.workers < extended.workers);
        assert!(quick.cycles < standard.cycles);
        assert!(standard.cycles < extended.cycles);
        assert!(quick.tls_rounds < extended.tls_rounds);
    }

    #[test]
    fn names_round_trip_through_the_parser() {
        for profile in [
            SoakProfile::Quick,
            SoakProfile::Standard,
            SoakProfile::Extended,
        ] {
            assert_eq!(SoakProfile::from_str_loose(profile.name()), profile);
        }
    }
}
