use std::{env, sync::LazyLock};

use super::types::LensFacing;

pub(super) static SCANNER_LENS_FACING: LazyLock<LensFacing> =
    LazyLock::new(|| parse_lens_facing(env::var("SCANNER_LENS_FACING").ok()));

fn parse_lens_facing(value: Option<String>) -> LensFacing {
    value.map_or(LensFacing::Back, |v| match v.to_lowercase().as_str() {
        "back" => LensFacing::Back,
        "front" => LensFacing::Front,
        invalid => {
            tracing::warn!("Invalid lens facing: {}. Using default 'back'", invalid);
            LensFacing::Back
        }
    })
}
