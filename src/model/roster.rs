//! People attached to a document: the executive-board roster shown in the
//! first page's sidebar and the signatories appended to the last page.

use serde::{Deserialize, Serialize};

use crate::error::PagewrightError;

/// A sidebar roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub role: String,
}

/// The "Executive Board" roster. Append and remove only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, role: &str) {
        self.members.push(Member {
            name: name.trim().to_string(),
            role: role.trim().to_string(),
        });
    }

    /// Remove the member at `index`, returning it if it existed.
    pub fn remove(&mut self, index: usize) -> Option<Member> {
        if index < self.members.len() {
            Some(self.members.remove(index))
        } else {
            None
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// The fixed signatory categories, in the order they print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignatoryCategory {
    #[serde(rename = "Prepared by:")]
    PreparedBy,
    #[serde(rename = "Noted by:")]
    NotedBy,
    #[serde(rename = "Approved by:")]
    ApprovedBy,
}

impl SignatoryCategory {
    pub const ALL: [SignatoryCategory; 3] = [
        SignatoryCategory::PreparedBy,
        SignatoryCategory::NotedBy,
        SignatoryCategory::ApprovedBy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SignatoryCategory::PreparedBy => "Prepared by:",
            SignatoryCategory::NotedBy => "Noted by:",
            SignatoryCategory::ApprovedBy => "Approved by:",
        }
    }

    /// "Prepared by:" holds exactly one person; the rest are unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            SignatoryCategory::PreparedBy => Some(1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatory {
    pub name: String,
    pub position: String,
}

/// Signatories grouped by category. Loading from JSON goes through
/// [`Signatories::add`], so category caps hold for drafts and CLI input too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSignatories")]
pub struct Signatories {
    #[serde(rename = "Prepared by:")]
    prepared_by: Vec<Signatory>,
    #[serde(rename = "Noted by:")]
    noted_by: Vec<Signatory>,
    #[serde(rename = "Approved by:")]
    approved_by: Vec<Signatory>,
}

#[derive(Deserialize)]
struct RawSignatories {
    #[serde(rename = "Prepared by:", default)]
    prepared_by: Vec<Signatory>,
    #[serde(rename = "Noted by:", default)]
    noted_by: Vec<Signatory>,
    #[serde(rename = "Approved by:", default)]
    approved_by: Vec<Signatory>,
}

impl TryFrom<RawSignatories> for Signatories {
    type Error = PagewrightError;

    fn try_from(raw: RawSignatories) -> Result<Self, Self::Error> {
        let mut signatories = Signatories::new();
        let loaded = [
            (SignatoryCategory::PreparedBy, raw.prepared_by),
            (SignatoryCategory::NotedBy, raw.noted_by),
            (SignatoryCategory::ApprovedBy, raw.approved_by),
        ];
        for (category, entries) in loaded {
            for entry in entries {
                signatories.add(category, &entry.name, &entry.position)?;
            }
        }
        Ok(signatories)
    }
}

impl Signatories {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, category: SignatoryCategory) -> &Vec<Signatory> {
        match category {
            SignatoryCategory::PreparedBy => &self.prepared_by,
            SignatoryCategory::NotedBy => &self.noted_by,
            SignatoryCategory::ApprovedBy => &self.approved_by,
        }
    }

    fn slot_mut(&mut self, category: SignatoryCategory) -> &mut Vec<Signatory> {
        match category {
            SignatoryCategory::PreparedBy => &mut self.prepared_by,
            SignatoryCategory::NotedBy => &mut self.noted_by,
            SignatoryCategory::ApprovedBy => &mut self.approved_by,
        }
    }

    pub fn get(&self, category: SignatoryCategory) -> &[Signatory] {
        self.slot(category)
    }

    /// Whether the "add" affordance for `category` should be offered.
    pub fn can_add(&self, category: SignatoryCategory) -> bool {
        match category.capacity() {
            Some(cap) => self.slot(category).len() < cap,
            None => true,
        }
    }

    pub fn add(
        &mut self,
        category: SignatoryCategory,
        name: &str,
        position: &str,
    ) -> Result<(), PagewrightError> {
        if !self.can_add(category) {
            return Err(PagewrightError::CategoryFull(category.label().to_string()));
        }
        self.slot_mut(category).push(Signatory {
            name: name.trim().to_string(),
            position: position.trim().to_string(),
        });
        Ok(())
    }

    pub fn remove(&mut self, category: SignatoryCategory, index: usize) -> Option<Signatory> {
        let slot = self.slot_mut(category);
        if index < slot.len() {
            Some(slot.remove(index))
        } else {
            None
        }
    }

    /// Non-empty categories in print order.
    pub fn groups(&self) -> impl Iterator<Item = (SignatoryCategory, &[Signatory])> {
        SignatoryCategory::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, s)| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.groups().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_by_holds_one() {
        let mut s = Signatories::new();
        assert!(s.can_add(SignatoryCategory::PreparedBy));
        s.add(SignatoryCategory::PreparedBy, "Ana Cruz", "Secretary").unwrap();
        assert!(!s.can_add(SignatoryCategory::PreparedBy));
        let err = s
            .add(SignatoryCategory::PreparedBy, "Ben Reyes", "President")
            .unwrap_err();
        assert!(matches!(err, PagewrightError::CategoryFull(ref l) if l == "Prepared by:"));
        assert_eq!(s.get(SignatoryCategory::PreparedBy).len(), 1);
    }

    #[test]
    fn other_categories_are_unbounded() {
        let mut s = Signatories::new();
        for i in 0..5 {
            s.add(SignatoryCategory::NotedBy, &format!("Adviser {}", i), "Adviser")
                .unwrap();
        }
        assert_eq!(s.get(SignatoryCategory::NotedBy).len(), 5);
        assert!(s.can_add(SignatoryCategory::NotedBy));
    }

    #[test]
    fn groups_skip_empty_categories_in_order() {
        let mut s = Signatories::new();
        assert!(s.is_empty());
        s.add(SignatoryCategory::ApprovedBy, "Dean", "Dean").unwrap();
        s.add(SignatoryCategory::PreparedBy, "Sec", "Secretary").unwrap();
        let labels: Vec<&str> = s.groups().map(|(c, _)| c.label()).collect();
        assert_eq!(labels, vec!["Prepared by:", "Approved by:"]);
    }

    #[test]
    fn removing_frees_the_prepared_by_slot() {
        let mut s = Signatories::new();
        s.add(SignatoryCategory::PreparedBy, "Sec", "Secretary").unwrap();
        assert!(s.remove(SignatoryCategory::PreparedBy, 0).is_some());
        assert!(s.can_add(SignatoryCategory::PreparedBy));
        assert!(s.remove(SignatoryCategory::PreparedBy, 0).is_none());
    }

    #[test]
    fn serializes_with_category_labels() {
        let mut s = Signatories::new();
        s.add(SignatoryCategory::NotedBy, "Adviser", "Faculty").unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["Noted by:"][0]["name"], "Adviser");
        assert_eq!(json["Prepared by:"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn loading_enforces_the_prepared_by_cap() {
        let one: Signatories = serde_json::from_value(serde_json::json!({
            "Prepared by:": [{ "name": "Ana", "position": "Secretary" }],
            "Noted by:": [
                { "name": "Adviser", "position": "Faculty" },
                { "name": "Co-adviser", "position": "Faculty" }
            ]
        }))
        .unwrap();
        assert_eq!(one.get(SignatoryCategory::PreparedBy).len(), 1);
        assert_eq!(one.get(SignatoryCategory::NotedBy).len(), 2);

        let err = serde_json::from_value::<Signatories>(serde_json::json!({
            "Prepared by:": [
                { "name": "Ana", "position": "Secretary" },
                { "name": "Ben", "position": "President" }
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("\"Prepared by:\" already has a signatory"));
    }

    #[test]
    fn roster_append_and_remove() {
        let mut r = Roster::new();
        r.add(" Ana ", "President");
        r.add("Ben", "Treasurer");
        assert_eq!(r.members()[0].name, "Ana");
        assert_eq!(r.remove(0).unwrap().role, "President");
        assert!(r.remove(5).is_none());
        assert_eq!(r.len(), 1);
    }
}
