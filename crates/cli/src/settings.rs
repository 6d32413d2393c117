//! Layered solve configuration: envelope, then `TIMETABLE__*` variables,
//! then command-line flags.

use crate::args::SolveOverrides;
use crate::telemetry::LogFormat;
use anyhow::Context;
use types::SolveParams;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub seed: Option<u64>,
    pub attempts: Option<u32>,
    pub log_format: Option<LogFormat>,
}

impl EnvSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let seed = get("TIMETABLE__SOLVE__SEED")
            .map(|v| v.trim().parse::<u64>().context("TIMETABLE__SOLVE__SEED"))
            .transpose()?;
        let attempts = get("TIMETABLE__SOLVE__ATTEMPTS")
            .map(|v| v.trim().parse::<u32>().context("TIMETABLE__SOLVE__ATTEMPTS"))
            .transpose()?;
        let log_format = get("TIMETABLE__LOG__FORMAT")
            .map(|v| v.parse::<LogFormat>().context("TIMETABLE__LOG__FORMAT"))
            .transpose()?;
        Ok(Self {
            seed,
            attempts,
            log_format,
        })
    }
}

pub fn apply(params: &mut SolveParams, env: &EnvSettings, flags: &SolveOverrides) {
    if let Some(seed) = flags.seed.or(env.seed) {
        params.seed = seed;
    }
    if let Some(attempts) = flags.attempts.or(env.attempts) {
        params.attempts = attempts;
    }
    if flags.no_backtracking {
        params.backtracking = false;
    }
    match flags.node_limit {
        Some(0) => params.backtrack_node_limit = None,
        Some(n) => params.backtrack_node_limit = Some(n),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn reads_prefixed_variables() {
        let env = EnvSettings::from_lookup(lookup(&[
            ("TIMETABLE__SOLVE__SEED", "17"),
            ("TIMETABLE__LOG__FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(env.seed, Some(17));
        assert_eq!(env.attempts, None);
        assert_eq!(env.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn rejects_garbage() {
        let err = EnvSettings::from_lookup(lookup(&[("TIMETABLE__SOLVE__ATTEMPTS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("TIMETABLE__SOLVE__ATTEMPTS"));
    }

    #[test]
    fn flags_beat_environment() {
        let mut params = SolveParams::default();
        let env = EnvSettings {
            seed: Some(1),
            attempts: Some(9),
            log_format: None,
        };
        let flags = SolveOverrides {
            seed: Some(2),
            node_limit: Some(0),
            no_backtracking: true,
            ..SolveOverrides::default()
        };
        apply(&mut params, &env, &flags);
        assert_eq!(params.seed, 2);
        assert_eq!(params.attempts, 9);
        assert!(!params.backtracking);
        assert_eq!(params.backtrack_node_limit, None);
    }
}
