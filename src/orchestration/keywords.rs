//! # Keyword Substitution Engine
//!
//! Replaces the two recognized placeholder tokens in template subjects and
//! bodies with recipient-specific values. Detection is a literal substring
//! match, not a template language. Name substitution batch-fetches display
//! names from the directory; number substitution is purely local. A recipient
//! with no identifier gets no substitution at all.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::clients::profile::ProfileClient;
use crate::error::Result;
use crate::models::Recipient;

/// Replaced with the recipient's looked-up display name
pub const RECIPIENT_NAME_TOKEN: &str = "$recipientName$";

/// Replaced with the recipient's own national identity or organization number
pub const RECIPIENT_NUMBER_TOKEN: &str = "$recipientNumber$";

/// Per-recipient content after substitution, parallel to the recipient list it
/// was produced from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizedContent {
    pub subject: Option<String>,
    pub body: String,
    /// True when subject or body differ from the literal template text
    pub customized: bool,
}

/// Token substitution over template content
pub struct KeywordEngine {
    profile_client: Arc<dyn ProfileClient>,
}

impl KeywordEngine {
    pub fn new(profile_client: Arc<dyn ProfileClient>) -> Self {
        Self { profile_client }
    }

    /// Literal substring check for either token
    pub fn contains_keywords(subject: Option<&str>, body: &str) -> bool {
        let in_text = |text: &str| {
            text.contains(RECIPIENT_NAME_TOKEN) || text.contains(RECIPIENT_NUMBER_TOKEN)
        };
        subject.map(in_text).unwrap_or(false) || in_text(body)
    }

    /// Substitute tokens for each recipient, returning content parallel to
    /// `recipients`. Display names are fetched in one batch per directory.
    pub async fn customize(
        &self,
        subject: Option<&str>,
        body: &str,
        recipients: &[Recipient],
    ) -> Result<Vec<CustomizedContent>> {
        if !Self::contains_keywords(subject, body) {
            return Ok(recipients
                .iter()
                .map(|_| CustomizedContent {
                    subject: subject.map(str::to_string),
                    body: body.to_string(),
                    customized: false,
                })
                .collect());
        }

        let needs_names = subject
            .map(|s| s.contains(RECIPIENT_NAME_TOKEN))
            .unwrap_or(false)
            || body.contains(RECIPIENT_NAME_TOKEN);

        let (person_names, org_names) = if needs_names {
            self.fetch_display_names(recipients).await?
        } else {
            (HashMap::new(), HashMap::new())
        };

        let content = recipients
            .iter()
            .map(|recipient| {
                let (name, number) = match (
                    &recipient.national_identity_number,
                    &recipient.organization_number,
                ) {
                    (Some(nin), _) => (
                        person_names.get(nin).cloned().unwrap_or_default(),
                        nin.clone(),
                    ),
                    (None, Some(org)) => (
                        org_names.get(org).cloned().unwrap_or_default(),
                        org.clone(),
                    ),
                    // No identifier: substitution is a no-op for this recipient.
                    (None, None) => {
                        return CustomizedContent {
                            subject: subject.map(str::to_string),
                            body: body.to_string(),
                            customized: false,
                        }
                    }
                };

                let substitute = |text: &str| {
                    text.replace(RECIPIENT_NAME_TOKEN, &name)
                        .replace(RECIPIENT_NUMBER_TOKEN, &number)
                };

                let new_subject = subject.map(substitute);
                let new_body = substitute(body);
                let customized = new_subject.as_deref() != subject || new_body != body;

                CustomizedContent {
                    subject: new_subject,
                    body: new_body,
                    customized,
                }
            })
            .collect();

        Ok(content)
    }

    async fn fetch_display_names(
        &self,
        recipients: &[Recipient],
    ) -> Result<(HashMap<String, String>, HashMap<String, String>)> {
        let mut national_ids: Vec<String> = recipients
            .iter()
            .filter_map(|r| r.national_identity_number.clone())
            .collect();
        national_ids.sort();
        national_ids.dedup();

        let mut org_numbers: Vec<String> = recipients
            .iter()
            .filter(|r| r.national_identity_number.is_none())
            .filter_map(|r| r.organization_number.clone())
            .collect();
        org_numbers.sort();
        org_numbers.dedup();

        debug!(
            persons = national_ids.len(),
            organizations = org_numbers.len(),
            "fetching display names for keyword substitution"
        );

        let person_names = if national_ids.is_empty() {
            HashMap::new()
        } else {
            self.profile_client
                .get_user_display_names(&national_ids)
                .await?
        };
        let org_names = if org_numbers.is_empty() {
            HashMap::new()
        } else {
            self.profile_client
                .get_organization_display_names(&org_numbers)
                .await?
        };

        Ok((person_names, org_names))
    }
}
