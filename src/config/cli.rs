use crate::config::toml_config::ClientConfig;
use crate::core::{NewDemande, PrestationFilter};
use crate::utils::error::{ClientError, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "prestations")]
#[command(about = "Browse prestations and submit demandes against the social services API")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "prestations.toml")]
    pub config: String,

    /// Override api.base_url from the configuration file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the prestation catalog
    Prestations {
        #[arg(long)]
        categorie: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Group the output by categorie
        #[arg(long)]
        grouped: bool,
    },
    /// Show one prestation
    Prestation { id: u64 },
    /// Submit a new demande
    Demander {
        #[arg(long)]
        prestation_id: u64,
        #[arg(long)]
        user_id: u64,
        #[arg(long)]
        motif: String,
        #[arg(long)]
        montant: Option<f64>,
        /// Document reference, repeatable
        #[arg(long = "document")]
        documents: Vec<String>,
    },
    /// List the demandes visible to the current session
    Demandes {
        #[arg(long)]
        user_id: u64,
    },
    /// Show one demande
    Demande { id: u64 },
}

impl CliConfig {
    /// Loads the configuration file, falling back to `--base-url` alone when
    /// the file does not exist. Command-line values win over the file.
    pub fn resolve_client_config(&self) -> Result<ClientConfig> {
        let mut config = match (Path::new(&self.config).exists(), &self.base_url) {
            (true, _) => ClientConfig::from_file(&self.config)?,
            (false, Some(base_url)) => ClientConfig::with_base_url(base_url.clone()),
            (false, None) => {
                return Err(ClientError::MissingConfigError {
                    field: format!("api.base_url (no file at '{}')", self.config),
                })
            }
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }

        Ok(config)
    }
}

impl Command {
    pub fn prestation_filter(&self) -> Option<PrestationFilter> {
        match self {
            Command::Prestations {
                categorie, search, ..
            } => Some(PrestationFilter {
                categorie: categorie.clone(),
                search: search.clone(),
            }),
            _ => None,
        }
    }

    pub fn new_demande(&self) -> Option<NewDemande> {
        match self {
            Command::Demander {
                prestation_id,
                user_id,
                motif,
                montant,
                documents,
            } => Some(NewDemande {
                prestation_id: *prestation_id,
                user_id: *user_id,
                motif: motif.clone(),
                montant_demande: *montant,
                documents: documents.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_demander_command() {
        let cli = CliConfig::parse_from([
            "prestations",
            "demander",
            "--prestation-id",
            "3",
            "--user-id",
            "7",
            "--motif",
            "Loss of income",
            "--document",
            "doc-1",
            "--document",
            "doc-2",
        ]);

        let demande = cli.command.new_demande().unwrap();
        assert_eq!(demande.prestation_id, 3);
        assert_eq!(demande.user_id, 7);
        assert_eq!(demande.documents, vec!["doc-1", "doc-2"]);
        assert_eq!(demande.montant_demande, None);
    }

    #[test]
    fn test_base_url_without_config_file() {
        let cli = CliConfig::parse_from([
            "prestations",
            "--config",
            "/nonexistent/prestations.toml",
            "--base-url",
            "http://localhost:9000",
            "prestation",
            "3",
        ]);

        let config = cli.resolve_client_config().unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_missing_config_and_base_url_fails() {
        let cli = CliConfig::parse_from([
            "prestations",
            "--config",
            "/nonexistent/prestations.toml",
            "demandes",
            "--user-id",
            "7",
        ]);

        assert!(cli.resolve_client_config().is_err());
    }

    #[test]
    fn test_base_url_flag_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[api]\nbase_url = \"https://social.example.org\"\nuser_email = \"jane@example.org\"\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let cli = CliConfig::parse_from([
            "prestations",
            "--config",
            path.as_str(),
            "--base-url",
            "http://localhost:9000",
            "prestations",
            "--categorie",
            "LOGEMENT",
        ]);

        let config = cli.resolve_client_config().unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.api.user_email.as_deref(), Some("jane@example.org"));
        assert_eq!(
            cli.command.prestation_filter().unwrap().categorie.as_deref(),
            Some("LOGEMENT")
        );
    }
}
