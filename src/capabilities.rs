//! Symmetric capability/requirement flag sets used to gate which scenes
//! can run on which backends.

use serde::Deserialize;

/// Feature flags a backend advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub supports_nonzero: bool,
    pub supports_evenodd: bool,
    pub supports_cap_butt: bool,
    pub supports_cap_round: bool,
    pub supports_cap_square: bool,
    pub supports_join_miter: bool,
    pub supports_join_round: bool,
    pub supports_join_bevel: bool,
    pub supports_dashes: bool,
    pub supports_linear_gradient: bool,
    pub supports_radial_gradient: bool,
    pub supports_clipping: bool,
    pub supports_source_over: bool,
    pub supports_parallel_render: bool,
}

impl Capabilities {
    /// Every feature enabled except parallel render.
    pub fn all() -> Self {
        Self {
            supports_nonzero: true,
            supports_evenodd: true,
            supports_cap_butt: true,
            supports_cap_round: true,
            supports_cap_square: true,
            supports_join_miter: true,
            supports_join_round: true,
            supports_join_bevel: true,
            supports_dashes: true,
            supports_linear_gradient: true,
            supports_radial_gradient: true,
            supports_clipping: true,
            supports_source_over: true,
            supports_parallel_render: false,
        }
    }

    /// Only the required baseline features.
    pub fn minimal() -> Self {
        Self {
            supports_evenodd: false,
            supports_cap_round: false,
            supports_cap_square: false,
            supports_join_round: false,
            supports_join_bevel: false,
            supports_dashes: false,
            supports_radial_gradient: false,
            supports_clipping: false,
            ..Self::all()
        }
    }
}

/// Feature flags a scene declares it needs. Deserialized from the
/// manifest's `required_features` object; absent flags default to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequiredFeatures {
    pub needs_nonzero: bool,
    pub needs_evenodd: bool,
    pub needs_cap_butt: bool,
    pub needs_cap_round: bool,
    pub needs_cap_square: bool,
    pub needs_join_miter: bool,
    pub needs_join_round: bool,
    pub needs_join_bevel: bool,
    pub needs_dashes: bool,
    pub needs_linear_gradient: bool,
    pub needs_radial_gradient: bool,
    pub needs_clipping: bool,
}

/// Check whether `caps` satisfies `required`. Returns `None` when
/// compatible, or the machine-readable reason for the first missing
/// feature in declaration order.
pub fn check_compatibility(caps: &Capabilities, required: &RequiredFeatures) -> Option<String> {
    let checks = [
        (required.needs_nonzero, caps.supports_nonzero, "nonzero"),
        (required.needs_evenodd, caps.supports_evenodd, "evenodd"),
        (required.needs_cap_butt, caps.supports_cap_butt, "cap_butt"),
        (required.needs_cap_round, caps.supports_cap_round, "cap_round"),
        (
            required.needs_cap_square,
            caps.supports_cap_square,
            "cap_square",
        ),
        (
            required.needs_join_miter,
            caps.supports_join_miter,
            "join_miter",
        ),
        (
            required.needs_join_round,
            caps.supports_join_round,
            "join_round",
        ),
        (
            required.needs_join_bevel,
            caps.supports_join_bevel,
            "join_bevel",
        ),
        (required.needs_dashes, caps.supports_dashes, "dashes"),
        (
            required.needs_linear_gradient,
            caps.supports_linear_gradient,
            "linear_gradient",
        ),
        (
            required.needs_radial_gradient,
            caps.supports_radial_gradient,
            "radial_gradient",
        ),
        (required.needs_clipping, caps.supports_clipping, "clipping"),
    ];

    for (needed, supported, flag) in checks {
        if needed && !supported {
            return Some(format!("UNSUPPORTED_FEATURE:{flag}"));
        }
    }
    None
}
