pub mod service;

pub use crate::domain::model::{Demande, DemandeStatus, NewDemande, Prestation, PrestationFilter};
pub use crate::domain::ports::{
    ConfigProvider, Headers, HttpRequest, HttpResponse, HttpTransport, Method, StatusCode,
};
pub use crate::utils::error::Result;
