// stat.ink v3 dictionary endpoints; overridable through Config.

pub const STAGE_ENDPOINT: &str = "https://stat.ink/api/v3/stage";
pub const WEAPON_ENDPOINT: &str = "https://stat.ink/api/v3/weapon";

pub const USER_AGENT: &str = concat!("splat_winrate/", env!("CARGO_PKG_VERSION"));
