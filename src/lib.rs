pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ClientConfig;

pub use adapters::http::ReqwestTransport;
pub use core::service::PrestationsService;
pub use domain::model::{
    group_by_categorie, Demande, DemandeStatus, NewDemande, Prestation, PrestationFilter,
};
pub use utils::error::{ClientError, Result};
