//! # Recipients and Address Points
//!
//! A recipient is a person or organization target identified by national
//! identity number, organization number, or an explicit address. Address points
//! are a tagged union over the two delivery mediums; matching switches on the
//! variant.
//!
//! Address points accumulate monotonically during contact-point resolution —
//! resolution appends, it never removes or replaces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery medium for an address point or a channel partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMedium {
    Email,
    Sms,
}

impl ContactMedium {
    /// The opposite medium, used by preferred-channel fallback partitioning
    pub fn fallback(&self) -> Self {
        match self {
            Self::Email => Self::Sms,
            Self::Sms => Self::Email,
        }
    }
}

/// A resolved or caller-supplied address for one medium
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "snake_case")]
pub enum AddressPoint {
    /// Email address
    Email(String),
    /// Mobile number, possibly without a country prefix
    Sms(String),
}

impl AddressPoint {
    pub fn medium(&self) -> ContactMedium {
        match self {
            Self::Email(_) => ContactMedium::Email,
            Self::Sms(_) => ContactMedium::Sms,
        }
    }

    pub fn is_email(&self) -> bool {
        matches!(self, Self::Email(_))
    }

    pub fn is_sms(&self) -> bool {
        matches!(self, Self::Sms(_))
    }

    /// The raw address string regardless of medium
    pub fn address(&self) -> &str {
        match self {
            Self::Email(address) | Self::Sms(address) => address,
        }
    }
}

/// A person or organization the order fans out to
///
/// At most one of {national identity number, organization number, external
/// identity} is meaningfully set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Explicit or directory-resolved addresses
    pub address_points: Vec<AddressPoint>,
    /// Reservation flag from the contact register, when known
    pub is_reserved: Option<bool>,
    /// National identity number, for person recipients
    pub national_identity_number: Option<String>,
    /// Organization number, for organization recipients
    pub organization_number: Option<String>,
    /// External identity URN, when neither national nor organization number applies
    pub external_identity: Option<String>,
}

impl Recipient {
    /// All email addresses attached to this recipient
    pub fn email_addresses(&self) -> Vec<String> {
        self.address_points
            .iter()
            .filter_map(|p| match p {
                AddressPoint::Email(address) => Some(address.clone()),
                AddressPoint::Sms(_) => None,
            })
            .collect()
    }

    /// All mobile numbers attached to this recipient
    pub fn mobile_numbers(&self) -> Vec<String> {
        self.address_points
            .iter()
            .filter_map(|p| match p {
                AddressPoint::Sms(number) => Some(number.clone()),
                AddressPoint::Email(_) => None,
            })
            .collect()
    }

    /// Whether any address point of the given medium is attached
    pub fn has_address_for(&self, medium: ContactMedium) -> bool {
        self.address_points.iter().any(|p| p.medium() == medium)
    }

    /// Whether the recipient carries no address point at all
    pub fn has_no_address(&self) -> bool {
        self.address_points.is_empty()
    }

    pub fn is_reserved(&self) -> bool {
        self.is_reserved.unwrap_or(false)
    }

    /// Key used to avoid duplicate entries when a recipient qualifies for more
    /// than one derived list: national identity number, else organization
    /// number, else a synthetic unique key.
    pub fn partition_key(&self) -> String {
        if let Some(nin) = &self.national_identity_number {
            return format!("person:{nin}");
        }
        if let Some(org) = &self.organization_number {
            return format!("org:{org}");
        }
        format!("anon:{}", Uuid::new_v4())
    }

    /// Append an address point, skipping exact duplicates
    pub fn append_address_point(&mut self, point: AddressPoint) {
        if !self.address_points.contains(&point) {
            self.address_points.push(point);
        }
    }
}

/// Projection of a recipient used as input to email delivery-unit creation
///
/// Carries the post-substitution content; not persisted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub addresses: Vec<String>,
    pub subject: String,
    pub body: String,
    pub national_identity_number: Option<String>,
    pub organization_number: Option<String>,
    pub is_reserved: bool,
    /// True when subject or body differ from the literal template text
    pub customized: bool,
}

/// Projection of a recipient used as input to SMS delivery-unit creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecipient {
    pub mobile_numbers: Vec<String>,
    pub body: String,
    pub national_identity_number: Option<String>,
    pub organization_number: Option<String>,
    pub is_reserved: bool,
    /// True when the body differs from the literal template text
    pub customized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(nin: &str) -> Recipient {
        Recipient {
            national_identity_number: Some(nin.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_address_point_medium() {
        let email = AddressPoint::Email("a@b.no".to_string());
        let sms = AddressPoint::Sms("+4799999999".to_string());
        assert!(email.is_email());
        assert!(sms.is_sms());
        assert_eq!(email.medium(), ContactMedium::Email);
        assert_eq!(sms.address(), "+4799999999");
    }

    #[test]
    fn test_medium_fallback() {
        assert_eq!(ContactMedium::Email.fallback(), ContactMedium::Sms);
        assert_eq!(ContactMedium::Sms.fallback(), ContactMedium::Email);
    }

    #[test]
    fn test_partition_key_prefers_national_identity() {
        let mut r = person("01017012345");
        r.organization_number = Some("912345678".to_string());
        assert_eq!(r.partition_key(), "person:01017012345");

        let org = Recipient {
            organization_number: Some("912345678".to_string()),
            ..Default::default()
        };
        assert_eq!(org.partition_key(), "org:912345678");
    }

    #[test]
    fn test_partition_key_synthetic_for_anonymous() {
        let r = Recipient::default();
        let key = r.partition_key();
        assert!(key.starts_with("anon:"));
        // Synthetic keys are unique per call; dedupe must compute them once.
        assert_ne!(key, r.partition_key());
    }

    #[test]
    fn test_append_address_point_skips_duplicates() {
        let mut r = person("01017012345");
        r.append_address_point(AddressPoint::Email("a@b.no".to_string()));
        r.append_address_point(AddressPoint::Email("a@b.no".to_string()));
        r.append_address_point(AddressPoint::Sms("+4799999999".to_string()));
        assert_eq!(r.address_points.len(), 2);
        assert_eq!(r.email_addresses(), vec!["a@b.no".to_string()]);
        assert_eq!(r.mobile_numbers(), vec!["+4799999999".to_string()]);
    }

    #[test]
    fn test_has_address_for_medium() {
        let mut r = Recipient::default();
        assert!(r.has_no_address());
        r.append_address_point(AddressPoint::Sms("99999999".to_string()));
        assert!(r.has_address_for(ContactMedium::Sms));
        assert!(!r.has_address_for(ContactMedium::Email));
    }
}
