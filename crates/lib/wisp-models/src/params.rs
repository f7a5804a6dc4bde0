use wisp_core::error::{SimError, SimResult};
use wisp_core::registry::{ModelSettings, ParamSpec};

/// Rejects parameters a model does not declare. `seed` is accepted everywhere; parameters
/// starting with one of `prefixes` describe distributions and are checked when those are read.
pub fn check_params(
    settings: &ModelSettings,
    specs: &[ParamSpec],
    prefixes: &[&str],
) -> SimResult<()> {
    let mut names: Vec<&String> = settings.params.keys().collect();
    names.sort();
    for name in names {
        let declared = name == "seed"
            || specs.iter().any(|spec| spec.name == name)
            || prefixes.iter().any(|prefix| {
                name == prefix || name.starts_with(&format!("{}_", prefix))
            });
        if !declared {
            return Err(SimError::config(
                format!("{}.params.{}", settings.model, name),
                "unknown parameter",
            ));
        }
    }
    Ok(())
}
