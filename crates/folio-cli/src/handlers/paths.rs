//! Paths command handler.
//!
//! Prints every resolved path in `key = value` form for diagnostics.

use folio_core::Settings;

use crate::error::CliError;

/// Execute the paths command.
pub fn execute(settings: &Settings) -> Result<(), CliError> {
    println!("{}", render(settings)?);
    Ok(())
}

/// Resolve and format the paths used by `settings`.
pub fn render(settings: &Settings) -> Result<String, CliError> {
    let data_dir = settings.resolve_data_dir()?;
    let roots = settings.resolve_storage_roots()?;
    let share_cache = settings.resolve_share_cache_dir()?;

    let external = roots
        .external
        .as_ref()
        .map_or_else(|| "(none)".to_string(), |p| p.display().to_string());

    Ok([
        format!("data_dir = {}", data_dir.display()),
        format!("database = {}", data_dir.join("folio.db").display()),
        format!("internal_storage = {}", roots.internal.display()),
        format!("external_storage = {external}"),
        format!("share_cache = {}", share_cache.display()),
    ]
    .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults_under_data_dir() {
        let mut settings = Settings::with_defaults();
        settings.data_dir = Some("/srv/folio".into());

        let out = render(&settings).unwrap();
        assert!(out.contains("data_dir = /srv/folio"));
        assert!(out.contains("database = /srv/folio/folio.db"));
        assert!(out.contains("internal_storage = /srv/folio/files"));
        assert!(out.contains("external_storage = (none)"));
        assert!(out.contains("share_cache = /srv/folio/cache/share"));
    }

    #[test]
    fn test_render_external_root() {
        let mut settings = Settings::with_defaults();
        settings.data_dir = Some("/srv/folio".into());
        settings.external_storage_dir = Some("/media/sd".into());

        let out = render(&settings).unwrap();
        assert!(out.contains("external_storage = /media/sd"));
    }
}
