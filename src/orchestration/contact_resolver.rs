//! # Contact Point Resolution
//!
//! Attaches directory-sourced address points to recipients that lack an
//! explicit address. Person and organization lookups run concurrently;
//! organization user-level contact points are filtered through the
//! authorization collaborator when the order carries a resource id.
//!
//! Addresses merge append-only onto the original recipients. Recipients whose
//! lookup produced no data in either directory are dropped from the output —
//! callers must expect a subset of the input.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::clients::authorization::AuthorizationClient;
use crate::clients::profile::{
    OrganizationContactPoints, ProfileClient, UserContactPoints,
};
use crate::error::Result;
use crate::models::{AddressPoint, ContactMedium, Recipient};

/// Which address types a resolution pass attaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Attach email addresses only
    EmailOnly,
    /// Attach mobile numbers only
    SmsOnly,
    /// Attach whichever of each type is present
    Both,
    /// Attach the preferred medium when present, else the fallback medium,
    /// never both; applied independently per recipient and per source
    Preferred(ContactMedium),
}

/// Directory-backed address resolution
pub struct ContactPointResolver {
    profile_client: Arc<dyn ProfileClient>,
    authorization_client: Arc<dyn AuthorizationClient>,
    /// Prefix assumed for unambiguous 8-digit national numbers
    default_country_prefix: String,
}

impl ContactPointResolver {
    pub fn new(
        profile_client: Arc<dyn ProfileClient>,
        authorization_client: Arc<dyn AuthorizationClient>,
        default_country_prefix: String,
    ) -> Self {
        Self {
            profile_client,
            authorization_client,
            default_country_prefix,
        }
    }

    /// Resolve contact points for `recipients` and merge them onto the
    /// originals. Recipients identified by neither national identity number
    /// nor organization number, and recipients with no directory match, are
    /// absent from the output.
    #[instrument(skip(self, recipients), fields(recipient_count = recipients.len()))]
    pub async fn resolve(
        &self,
        recipients: Vec<Recipient>,
        resource_id: Option<&str>,
        mode: ResolutionMode,
    ) -> Result<Vec<Recipient>> {
        let national_ids: Vec<String> = recipients
            .iter()
            .filter_map(|r| r.national_identity_number.clone())
            .collect();
        let org_numbers: Vec<String> = recipients
            .iter()
            .filter(|r| r.national_identity_number.is_none())
            .filter_map(|r| r.organization_number.clone())
            .collect();

        // Person and organization lookups have no ordering dependency.
        let (person_lookup, org_lookup) = tokio::join!(
            self.lookup_persons(&national_ids),
            self.lookup_organizations(&org_numbers, resource_id)
        );
        let person_lookup = person_lookup?;
        let org_lookup = org_lookup?;

        debug!(
            persons_found = person_lookup.len(),
            organizations_found = org_lookup.len(),
            "directory lookups complete"
        );

        let mut resolved = Vec::new();
        for mut recipient in recipients {
            if let Some(nin) = recipient.national_identity_number.clone() {
                let Some(contact_points) = person_lookup.get(&nin) else {
                    continue;
                };
                recipient.is_reserved = Some(contact_points.is_reserved);
                self.attach_user_contact_points(&mut recipient, contact_points, mode);
                resolved.push(recipient);
            } else if let Some(org) = recipient.organization_number.clone() {
                let Some(contact_points) = org_lookup.get(&org) else {
                    continue;
                };
                self.attach_organization_contact_points(&mut recipient, contact_points, mode);
                resolved.push(recipient);
            }
            // Recipients with neither identifier are dropped from resolution.
        }

        Ok(resolved)
    }

    /// Resolve contact points only for the recipients that still need them
    /// for this mode, and merge the augmented recipients back into the full
    /// list. Recipients the directories cannot match keep their original
    /// (addressless) entry, so downstream generation records their outcome.
    pub async fn resolve_missing(
        &self,
        recipients: Vec<Recipient>,
        resource_id: Option<&str>,
        mode: ResolutionMode,
    ) -> Result<Vec<Recipient>> {
        let needs_lookup = |recipient: &Recipient| match mode {
            ResolutionMode::EmailOnly => !recipient.has_address_for(ContactMedium::Email),
            ResolutionMode::SmsOnly => !recipient.has_address_for(ContactMedium::Sms),
            ResolutionMode::Both | ResolutionMode::Preferred(_) => recipient.has_no_address(),
        };

        let (missing, addressed): (Vec<Recipient>, Vec<Recipient>) =
            recipients.into_iter().partition(needs_lookup);
        if missing.is_empty() {
            return Ok(addressed);
        }

        let resolved = self
            .resolve(missing.clone(), resource_id, mode)
            .await?;

        // The resolver output is an order-preserving subset of `missing`;
        // walk both lists, substituting augmented entries where they match.
        let mut resolved_iter = resolved.into_iter().peekable();
        let mut merged = addressed;
        for original in missing {
            let matches = resolved_iter.peek().is_some_and(|r| {
                r.national_identity_number == original.national_identity_number
                    && r.organization_number == original.organization_number
            });
            if matches {
                merged.push(resolved_iter.next().unwrap_or(original));
            } else {
                merged.push(original);
            }
        }

        Ok(merged)
    }

    /// Ensure a country prefix is present only when this can be inferred
    /// unambiguously: an 8-digit national number starting with 4 or 9 gets the
    /// configured default prefix. Everything else passes through unchanged.
    pub fn ensure_country_prefix(&self, number: &str) -> String {
        if number.len() == 8
            && number.chars().all(|c| c.is_ascii_digit())
            && (number.starts_with('4') || number.starts_with('9'))
        {
            return format!("{}{}", self.default_country_prefix, number);
        }
        number.to_string()
    }

    async fn lookup_persons(
        &self,
        national_ids: &[String],
    ) -> Result<HashMap<String, UserContactPoints>> {
        if national_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let contact_points = self
            .profile_client
            .get_user_contact_points(national_ids)
            .await?;
        Ok(contact_points
            .into_iter()
            .map(|cp| (cp.national_identity_number.clone(), cp))
            .collect())
    }

    async fn lookup_organizations(
        &self,
        org_numbers: &[String],
        resource_id: Option<&str>,
    ) -> Result<HashMap<String, OrganizationContactPoints>> {
        if org_numbers.is_empty() {
            return Ok(HashMap::new());
        }
        let mut contact_points = self
            .profile_client
            .get_organization_contact_points(org_numbers)
            .await?;

        // User-registered contact points are only attached when the
        // authorization collaborator grants access to the resource.
        if let Some(resource_id) = resource_id {
            for org in &mut contact_points {
                let user_points = std::mem::take(&mut org.user_contact_points);
                org.user_contact_points = self
                    .authorization_client
                    .authorized_user_contact_points(
                        user_points,
                        &org.organization_number,
                        resource_id,
                    )
                    .await?;
            }
        }

        Ok(contact_points
            .into_iter()
            .map(|cp| (cp.organization_number.clone(), cp))
            .collect())
    }

    /// Attach a person lookup result. The preferred/fallback rule applies to
    /// this contact point as one source.
    fn attach_user_contact_points(
        &self,
        recipient: &mut Recipient,
        contact_points: &UserContactPoints,
        mode: ResolutionMode,
    ) {
        let email = contact_points.email.as_deref().filter(|e| !e.is_empty());
        let mobile = contact_points
            .mobile_number
            .as_deref()
            .filter(|m| !m.is_empty());

        match mode {
            ResolutionMode::EmailOnly => {
                if let Some(email) = email {
                    recipient.append_address_point(AddressPoint::Email(email.to_string()));
                }
            }
            ResolutionMode::SmsOnly => {
                if let Some(mobile) = mobile {
                    recipient
                        .append_address_point(AddressPoint::Sms(self.ensure_country_prefix(mobile)));
                }
            }
            ResolutionMode::Both => {
                if let Some(email) = email {
                    recipient.append_address_point(AddressPoint::Email(email.to_string()));
                }
                if let Some(mobile) = mobile {
                    recipient
                        .append_address_point(AddressPoint::Sms(self.ensure_country_prefix(mobile)));
                }
            }
            ResolutionMode::Preferred(preferred) => {
                self.attach_preferred(recipient, email, mobile, preferred);
            }
        }
    }

    /// Attach an organization lookup result: the official notification
    /// addresses count as one source, each user-registered contact point as
    /// another.
    fn attach_organization_contact_points(
        &self,
        recipient: &mut Recipient,
        contact_points: &OrganizationContactPoints,
        mode: ResolutionMode,
    ) {
        match mode {
            ResolutionMode::EmailOnly => {
                for email in &contact_points.email_addresses {
                    recipient.append_address_point(AddressPoint::Email(email.clone()));
                }
            }
            ResolutionMode::SmsOnly => {
                for mobile in &contact_points.mobile_numbers {
                    recipient
                        .append_address_point(AddressPoint::Sms(self.ensure_country_prefix(mobile)));
                }
            }
            ResolutionMode::Both => {
                for email in &contact_points.email_addresses {
                    recipient.append_address_point(AddressPoint::Email(email.clone()));
                }
                for mobile in &contact_points.mobile_numbers {
                    recipient
                        .append_address_point(AddressPoint::Sms(self.ensure_country_prefix(mobile)));
                }
            }
            ResolutionMode::Preferred(preferred) => {
                let (preferred_list, fallback_list): (&[String], &[String]) = match preferred {
                    ContactMedium::Email => (
                        &contact_points.email_addresses,
                        &contact_points.mobile_numbers,
                    ),
                    ContactMedium::Sms => (
                        &contact_points.mobile_numbers,
                        &contact_points.email_addresses,
                    ),
                };
                let (list, medium) = if preferred_list.is_empty() {
                    (fallback_list, preferred.fallback())
                } else {
                    (preferred_list, preferred)
                };
                for address in list {
                    recipient.append_address_point(match medium {
                        ContactMedium::Email => AddressPoint::Email(address.clone()),
                        ContactMedium::Sms => {
                            AddressPoint::Sms(self.ensure_country_prefix(address))
                        }
                    });
                }
            }
        }

        for user in &contact_points.user_contact_points {
            let email = user.email.as_deref().filter(|e| !e.is_empty());
            let mobile = user.mobile_number.as_deref().filter(|m| !m.is_empty());
            match mode {
                ResolutionMode::EmailOnly => {
                    if let Some(email) = email {
                        recipient.append_address_point(AddressPoint::Email(email.to_string()));
                    }
                }
                ResolutionMode::SmsOnly => {
                    if let Some(mobile) = mobile {
                        recipient.append_address_point(AddressPoint::Sms(
                            self.ensure_country_prefix(mobile),
                        ));
                    }
                }
                ResolutionMode::Both => {
                    if let Some(email) = email {
                        recipient.append_address_point(AddressPoint::Email(email.to_string()));
                    }
                    if let Some(mobile) = mobile {
                        recipient.append_address_point(AddressPoint::Sms(
                            self.ensure_country_prefix(mobile),
                        ));
                    }
                }
                ResolutionMode::Preferred(preferred) => {
                    self.attach_preferred(recipient, email, mobile, preferred);
                }
            }
        }
    }

    /// Preferred-medium attachment for a single-address source: the preferred
    /// address when present, else the fallback address, never both.
    fn attach_preferred(
        &self,
        recipient: &mut Recipient,
        email: Option<&str>,
        mobile: Option<&str>,
        preferred: ContactMedium,
    ) {
        let point = match preferred {
            ContactMedium::Email => email
                .map(|e| AddressPoint::Email(e.to_string()))
                .or_else(|| mobile.map(|m| AddressPoint::Sms(self.ensure_country_prefix(m)))),
            ContactMedium::Sms => mobile
                .map(|m| AddressPoint::Sms(self.ensure_country_prefix(m)))
                .or_else(|| email.map(|e| AddressPoint::Email(e.to_string()))),
        };
        if let Some(point) = point {
            recipient.append_address_point(point);
        }
    }
}
