//! Edge-type filters for pathfinding.
//!
//! One `PathFilter` per known relationship kind, grouped by platform category
//! and subcategory. A pathfinding query only traverses the checked kinds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathFilter {
    pub category: String,
    pub subcategory: String,
    #[serde(rename = "edgeType")]
    pub edge_type: String,
    pub checked: bool,
}

pub struct Subcategory {
    pub name: &'static str,
    pub edge_types: &'static [&'static str],
}

pub struct Category {
    pub name: &'static str,
    pub subcategories: &'static [Subcategory],
}

pub const EDGE_CATALOG: &[Category] = &[
    Category {
        name: "Active Directory",
        subcategories: &[
            Subcategory {
                name: "Active Directory Structure",
                edge_types: &["Contains", "DCFor", "GPLink", "ClaimSpecialIdentity", "HasSIDHistory", "MemberOf", "SameForestTrust"],
            },
            Subcategory {
                name: "Lateral Movement",
                edge_types: &["AdminTo", "AllowedToAct", "AllowedToDelegate", "CanPSRemote", "CanRDP", "ExecuteDCOM", "SQLAdmin", "CanBackup"],
            },
            Subcategory {
                name: "Credential Access",
                edge_types: &[
                    "CoerceToTGT",
                    "DCSync",
                    "DumpSMSAPassword",
                    "HasSession",
                    "ReadGMSAPassword",
                    "ReadLAPSPassword",
                    "SyncLAPSPassword",
                    "HasTrustKeys",
                ],
            },
            Subcategory {
                name: "Basic Object Manipulation",
                edge_types: &[
                    "AddMember",
                    "AddSelf",
                    "AllExtendedRights",
                    "ForceChangePassword",
                    "GenericAll",
                    "Owns",
                    "OwnsLimitedRights",
                    "ProtectAdminGroups",
                    "GenericWrite",
                    "WriteDacl",
                    "WriteOwner",
                    "WriteOwnerLimitedRights",
                ],
            },
            Subcategory {
                name: "Advanced Object Manipulation",
                edge_types: &["AddAllowedToAct", "AddKeyCredentialLink", "WriteAccountRestrictions", "WriteGPLink", "WriteSPN"],
            },
            Subcategory {
                name: "Active Directory Certificate Services",
                edge_types: &[
                    "GoldenCert",
                    "ManageCA",
                    "ManageCertificates",
                    "ADCSESC1",
                    "ADCSESC3",
                    "ADCSESC4",
                    "ADCSESC6a",
                    "ADCSESC6b",
                    "ADCSESC9a",
                    "ADCSESC9b",
                    "ADCSESC10a",
                    "ADCSESC10b",
                    "ADCSESC13",
                ],
            },
            Subcategory { name: "Cross Forest Trust Abuse", edge_types: &["SpoofSIDHistory", "AbuseTGTDelegation"] },
            Subcategory { name: "Cross Platform", edge_types: &["SyncedToEntraUser"] },
            Subcategory {
                name: "NTLM Relay",
                edge_types: &[
                    "CoerceAndRelayNTLMToSMB",
                    "CoerceAndRelayNTLMToADCS",
                    "CoerceAndRelayNTLMToLDAP",
                    "CoerceAndRelayNTLMToLDAPS",
                ],
            },
        ],
    },
    Category {
        name: "Azure",
        subcategories: &[
            Subcategory {
                name: "Structure",
                edge_types: &[
                    "AZAppAdmin",
                    "AZCloudAppAdmin",
                    "AZContains",
                    "AZGlobalAdmin",
                    "AZHasRole",
                    "AZManagedIdentity",
                    "AZMemberOf",
                    "AZNodeResourceGroup",
                    "AZPrivilegedAuthAdmin",
                    "AZPrivilegedRoleAdmin",
                    "AZRunsAs",
                    "AZRoleEligible",
                    "AZRoleApprover",
                ],
            },
            Subcategory {
                name: "Basic AzureAD Object Manipulation",
                edge_types: &[
                    "AZAddMembers",
                    "AZAddOwner",
                    "AZAddSecret",
                    "AZExecuteCommand",
                    "AZGrant",
                    "AZGrantSelf",
                    "AZOwns",
                    "AZResetPassword",
                ],
            },
            Subcategory {
                name: "MS Graph App Role Abuses",
                edge_types: &["AZMGAddMember", "AZMGAddOwner", "AZMGAddSecret", "AZMGGrantAppRoles", "AZMGGrantRole"],
            },
            Subcategory { name: "Secret/Credential Access", edge_types: &["AZGetCertificates", "AZGetKeys", "AZGetSecrets"] },
            Subcategory {
                name: "Basic AzureRM Object Manipulation",
                edge_types: &[
                    "AZAvereContributor",
                    "AZKeyVaultContributor",
                    "AZOwner",
                    "AZContributor",
                    "AZUserAccessAdministrator",
                    "AZVMAdminLogin",
                    "AZVMContributor",
                ],
            },
            Subcategory {
                name: "Advanced AzureRM Object Manipulation",
                edge_types: &["AZAKSContributor", "AZAutomationContributor", "AZLogicAppContributor", "AZWebsiteContributor"],
            },
            Subcategory { name: "Cross Platform", edge_types: &["SyncedToADUser"] },
        ],
    },
];

/// Every catalog edge type, all checked.
pub fn default_path_filters() -> Vec<PathFilter> {
    EDGE_CATALOG
        .iter()
        .flat_map(|category| {
            category.subcategories.iter().flat_map(move |sub| {
                sub.edge_types.iter().map(move |edge_type| PathFilter {
                    category: category.name.to_string(),
                    subcategory: sub.name.to_string(),
                    edge_type: edge_type.to_string(),
                    checked: true,
                })
            })
        })
        .collect()
}

// Checked filters projected to their edge type, in filter order
pub fn enabled_edge_types(filters: &[PathFilter]) -> Vec<String> {
    filters.iter().filter(|f| f.checked).map(|f| f.edge_type.clone()).collect()
}

/// Flip one edge type everywhere it appears. Returns false if it is unknown.
pub fn toggle_edge_type(filters: &mut [PathFilter], edge_type: &str) -> bool {
    let mut found = false;
    for f in filters.iter_mut().filter(|f| f.edge_type == edge_type) {
        f.checked = !f.checked;
        found = true;
    }
    found
}

pub fn set_edge_type_checked(filters: &mut [PathFilter], edge_type: &str, checked: bool) -> bool {
    let mut found = false;
    for f in filters.iter_mut().filter(|f| f.edge_type == edge_type) {
        f.checked = checked;
        found = true;
    }
    found
}

pub fn set_category_checked(filters: &mut [PathFilter], category: &str, checked: bool) -> usize {
    let mut n = 0;
    for f in filters.iter_mut().filter(|f| f.category == category) {
        f.checked = checked;
        n += 1;
    }
    n
}

// Subcategory names repeat across categories ("Cross Platform"), so both are needed
pub fn set_subcategory_checked(filters: &mut [PathFilter], category: &str, subcategory: &str, checked: bool) -> usize {
    let mut n = 0;
    for f in filters.iter_mut().filter(|f| f.category == category && f.subcategory == subcategory) {
        f.checked = checked;
        n += 1;
    }
    n
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

fn check_state<'a>(mut filters: impl Iterator<Item = &'a PathFilter>) -> CheckState {
    let Some(first) = filters.next() else { return CheckState::Unchecked };
    let want = first.checked;
    if filters.all(|f| f.checked == want) {
        if want { CheckState::Checked } else { CheckState::Unchecked }
    } else {
        CheckState::Indeterminate
    }
}

pub fn category_state(filters: &[PathFilter], category: &str) -> CheckState {
    check_state(filters.iter().filter(|f| f.category == category))
}

pub fn subcategory_state(filters: &[PathFilter], category: &str, subcategory: &str) -> CheckState {
    check_state(filters.iter().filter(|f| f.category == category && f.subcategory == subcategory))
}
