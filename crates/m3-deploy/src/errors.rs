use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Mod folder not found: {path}")]
    #[diagnostic(
        code(mod_folder::not_found),
        help("Pass the folder that contains the mod's moddesc.ini")
    )]
    ModFolderNotFound { path: Utf8PathBuf },

    #[error("Failed to load mod from {path}")]
    #[diagnostic(
        code(mod_folder::load_failed),
        help("Check moddesc.ini for a [ModInfo] section with modname and a valid game")
    )]
    ModLoadFailed {
        path: Utf8PathBuf,
        #[source]
        source: m3_mod_project::Error,
    },

    #[error("Mods '{first}' and '{second}' collide in the archive as '{token}'")]
    #[diagnostic(
        code(deploy::name_collision),
        help("Rename one of the mods so their names differ after removing special characters")
    )]
    ModNameCollision {
        first: String,
        second: String,
        token: String,
    },

    #[error("Mod name '{name}' cannot be used as a folder name")]
    #[diagnostic(
        code(deploy::invalid_mod_name),
        help("The mod name must contain at least one letter or digit")
    )]
    InvalidModName { name: String },

    #[error("Source file disappeared during deployment: {path}")]
    #[diagnostic(
        code(deploy::source_missing),
        help("Do not modify the mod folders while a deployment is running. The partial archive was left on disk.")
    )]
    SourceFileMissing { path: Utf8PathBuf },

    #[error("Deployment failed")]
    #[diagnostic(
        code(deploy::failed),
        help("The partial archive was left on disk and should be deleted")
    )]
    DeploymentFailed {
        #[source]
        source: m3_archive::Error,
    },

    #[error("Failed to load the third-party catalog: {path}")]
    #[diagnostic(
        code(catalog::load_failed),
        help("Set a valid catalog with 'm3-deploy config set-catalog <path>' or pass --catalog")
    )]
    CatalogLoadFailed {
        path: Utf8PathBuf,
        #[source]
        source: m3_archive::Error,
    },

    #[error("Directory creation failed: {path}")]
    #[diagnostic(
        code(fs::create_dir_failed),
        help("Check file permissions and available disk space")
    )]
    DirectoryCreationFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not valid UTF-8: {path}")]
    #[diagnostic(code(fs::non_utf8_path))]
    NonUtf8Path { path: String },
}

impl CliError {
    pub fn mod_load_failed(path: Utf8PathBuf, source: m3_mod_project::Error) -> Self {
        match source {
            m3_mod_project::Error::MissingModDesc(_) => Self::ModFolderNotFound { path },
            source => Self::ModLoadFailed { path, source },
        }
    }

    pub fn catalog_load_failed(path: Utf8PathBuf, source: m3_archive::Error) -> Self {
        Self::CatalogLoadFailed { path, source }
    }

    pub fn directory_creation_failed(path: Utf8PathBuf, source: std::io::Error) -> Self {
        Self::DirectoryCreationFailed { path, source }
    }
}

impl From<m3_archive::Error> for CliError {
    fn from(source: m3_archive::Error) -> Self {
        match source {
            m3_archive::Error::ModNameCollision {
                first,
                second,
                token,
            } => Self::ModNameCollision {
                first,
                second,
                token,
            },
            m3_archive::Error::InvalidModName(name) => Self::InvalidModName { name },
            m3_archive::Error::SourceFileMissing(path) => Self::SourceFileMissing { path },
            source => Self::DeploymentFailed { source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_errors_map_to_specific_variants() {
        let collision = CliError::from(m3_archive::Error::ModNameCollision {
            first: "A B".to_string(),
            second: "AB".to_string(),
            token: "AB".to_string(),
        });
        assert!(matches!(collision, CliError::ModNameCollision { .. }));

        let missing = CliError::from(m3_archive::Error::SourceFileMissing(Utf8PathBuf::from(
            "/mods/a.pcc",
        )));
        assert!(matches!(missing, CliError::SourceFileMissing { .. }));

        let engine = CliError::from(m3_archive::Error::ArchiveEngine("disk full".to_string()));
        assert!(matches!(engine, CliError::DeploymentFailed { .. }));
    }

    #[test]
    fn test_missing_moddesc_maps_to_folder_not_found() {
        let path = Utf8PathBuf::from("/mods/nothing");
        let err = CliError::mod_load_failed(
            path.clone(),
            m3_mod_project::Error::MissingModDesc(path.clone()),
        );
        assert!(matches!(err, CliError::ModFolderNotFound { path: p } if p == path));
    }
}
