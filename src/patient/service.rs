//! Patient operations

use super::model::{Bundle, Patient};
use super::search::PatientSearchOptions;
use crate::client::Client;
use crate::error::Result;
use crate::http::{Context, Response};
use crate::query::add_params_to_url;
use crate::validation::validate_nhs_number;
use reqwest::Method;
use tracing::debug;

const PATIENT_PATH: &str = "Patient";

/// Patient lookups against the Personal Demographics Service
#[derive(Debug, Clone, Copy)]
pub struct PatientService<'a> {
    client: &'a Client,
}

impl<'a> PatientService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Retrieve a patient by NHS number
    ///
    /// The number is checked before anything is sent.
    pub async fn get(&self, ctx: &Context, nhs_number: &str) -> Result<Patient> {
        self.get_with_response(ctx, nhs_number)
            .await
            .map(|(patient, _)| patient)
    }

    /// Like [`get`](Self::get), also returning the response metadata
    pub async fn get_with_response(
        &self,
        ctx: &Context,
        nhs_number: &str,
    ) -> Result<(Patient, Response)> {
        validate_nhs_number(nhs_number)?;

        let path = format!("{PATIENT_PATH}/{nhs_number}");
        let request = self
            .client
            .new_request(ctx, Method::GET, &path, None::<&()>)
            .await?;
        self.client.execute(ctx, request).await
    }

    /// Search for patients; no matches is an empty list
    pub async fn search(
        &self,
        ctx: &Context,
        options: &PatientSearchOptions,
    ) -> Result<Vec<Patient>> {
        let bundle = self.search_bundle(ctx, options).await?;
        debug!("Patient search matched {} entries", bundle.entry.len());
        Ok(bundle.into_patients())
    }

    /// Search and return the raw bundle, scores included
    pub async fn search_bundle(
        &self,
        ctx: &Context,
        options: &PatientSearchOptions,
    ) -> Result<Bundle> {
        let path = add_params_to_url(PATIENT_PATH, options);
        let request = self
            .client
            .new_request(ctx, Method::GET, &path, None::<&()>)
            .await?;
        let (bundle, _) = self.client.execute(ctx, request).await?;
        Ok(bundle)
    }
}
