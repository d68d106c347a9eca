// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use aws_config::SdkConfig;
use aws_sdk_ssm::Client;

use crate::aws::sdk_credentials;
use crate::credential::DelegatedCredential;
use crate::params::ParameterStore;
use crate::BoxFuture;

/// `GetParameters` accepts at most this many names per request.
const MAX_NAMES_PER_REQUEST: usize = 10;

/// Parameter store backed by SSM `GetParameters`.
pub struct SsmParameterStore {
    sdk: SdkConfig,
    ambient: Client,
}

impl SsmParameterStore {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self { sdk: sdk.clone(), ambient: Client::new(sdk) }
    }

    fn client(&self, credential: Option<&DelegatedCredential>) -> Client {
        match credential {
            Some(cred) => {
                let conf = aws_sdk_ssm::config::Builder::from(&self.sdk)
                    .credentials_provider(sdk_credentials(cred))
                    .build();
                Client::from_conf(conf)
            }
            None => self.ambient.clone(),
        }
    }
}

impl ParameterStore for SsmParameterStore {
    fn fetch<'a>(
        &'a self,
        names: &'a [String],
        with_decryption: bool,
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, anyhow::Result<HashMap<String, String>>> {
        Box::pin(async move {
            let client = self.client(credential);
            let mut values = HashMap::new();
            for chunk in names.chunks(MAX_NAMES_PER_REQUEST) {
                let out = client
                    .get_parameters()
                    .set_names(Some(chunk.to_vec()))
                    .with_decryption(with_decryption)
                    .send()
                    .await?;

                for invalid in out.invalid_parameters() {
                    tracing::debug!(name = %invalid, "parameter store reports name as invalid");
                }
                for param in out.parameters() {
                    if let (Some(name), Some(value)) = (param.name(), param.value()) {
                        values.insert(name.to_owned(), value.to_owned());
                    }
                }
            }
            Ok(values)
        })
    }
}
