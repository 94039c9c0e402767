//! Built-in starter taxonomies.

use super::{Area, Category, Taxonomy};
use serde::Serialize;

/// Key of the template used when a library has no taxonomy document.
pub const DEFAULT_TEMPLATE: &str = "personal";

type CategorySpec = (&'static str, &'static str, &'static [&'static str]);

/// One area of a template.
#[derive(Debug)]
pub struct AreaSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub categories: &'static [CategorySpec],
}

/// A named starter taxonomy.
#[derive(Debug)]
pub struct Template {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub areas: &'static [AreaSpec],
}

/// Summary row for listings.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl Template {
    /// Materialize the template as a taxonomy.
    pub fn taxonomy(&self) -> Taxonomy {
        let areas = self
            .areas
            .iter()
            .map(|area| {
                let categories = area
                    .categories
                    .iter()
                    .map(|(name, description, keywords)| {
                        (name.to_string(), Category::with_keywords(description, keywords))
                    })
                    .collect();
                (
                    area.name.to_string(),
                    Area {
                        description: area.description.to_string(),
                        categories,
                    },
                )
            })
            .collect();
        Taxonomy::from_areas(areas)
    }

    pub fn info(&self) -> TemplateInfo {
        TemplateInfo {
            key: self.key,
            name: self.name,
            description: self.description,
        }
    }
}

const SYSTEM_AREA: AreaSpec = AreaSpec {
    name: "00-09 System",
    description: "System folders",
    categories: &[
        ("00 Index", "Master index", &[]),
        ("01 Inbox", "Incoming documents", &[]),
    ],
};

static TEMPLATES: &[Template] = &[
    Template {
        key: "personal",
        name: "Personal Life Admin",
        description: "For managing personal documents, finances, and life admin",
        areas: &[
            SYSTEM_AREA,
            AreaSpec {
                name: "10-19 Finance",
                description: "Personal finances",
                categories: &[
                    ("11 Banking", "Bank statements", &["bank", "statement", "account"]),
                    ("12 Taxes", "Tax documents", &["tax", "return"]),
                    ("13 Insurance", "Insurance policies", &["insurance", "policy"]),
                    ("14 Receipts", "Purchase receipts", &["receipt", "purchase"]),
                ],
            },
            AreaSpec {
                name: "20-29 Medical",
                description: "Health and medical",
                categories: &[
                    ("21 Records", "Medical records", &["doctor", "medical", "hospital"]),
                    ("22 Insurance", "Health insurance", &["health insurance"]),
                ],
            },
            AreaSpec {
                name: "30-39 Legal",
                description: "Legal documents",
                categories: &[
                    ("31 Contracts", "Contracts and agreements", &["contract", "agreement"]),
                    ("32 Identity", "ID documents", &["passport", "id", "license"]),
                ],
            },
        ],
    },
    Template {
        key: "freelance",
        name: "Freelancer / Self-Employed",
        description: "For freelancers managing personal and business documents",
        areas: &[
            SYSTEM_AREA,
            AreaSpec {
                name: "10-19 Personal Finance",
                description: "Personal finances",
                categories: &[
                    ("11 Banking", "Personal bank accounts", &["bank", "personal"]),
                    ("12 Taxes", "Personal taxes", &["tax", "personal"]),
                ],
            },
            AreaSpec {
                name: "20-29 Business",
                description: "Business operations",
                categories: &[
                    ("21 Clients", "Client documents", &["client", "customer"]),
                    ("22 Invoices", "Invoices sent", &["invoice", "billing"]),
                    ("23 Expenses", "Business expenses", &["expense", "receipt"]),
                    ("24 Contracts", "Business contracts", &["contract", "agreement"]),
                    ("25 Taxes", "Business taxes", &["business tax", "vat"]),
                ],
            },
            AreaSpec {
                name: "30-39 Medical",
                description: "Health documents",
                categories: &[("31 Records", "Medical records", &["medical", "doctor"])],
            },
        ],
    },
    Template {
        key: "employee",
        name: "Employee",
        description: "For employees managing work and personal documents",
        areas: &[
            SYSTEM_AREA,
            AreaSpec {
                name: "10-19 Finance",
                description: "Personal finances",
                categories: &[
                    ("11 Banking", "Bank statements", &["bank", "statement"]),
                    ("12 Taxes", "Tax documents", &["tax", "return"]),
                    ("13 Insurance", "Insurance", &["insurance"]),
                    ("14 Receipts", "Receipts", &["receipt"]),
                ],
            },
            AreaSpec {
                name: "20-29 Work",
                description: "Employment documents",
                categories: &[
                    ("21 Employment", "Job contracts and HR", &["employment", "contract", "hr"]),
                    ("22 Salary", "Pay slips and bonuses", &["salary", "payslip", "bonus"]),
                    ("23 Expenses", "Work expenses", &["expense", "reimbursement"]),
                    ("24 Training", "Training and certifications", &["training", "certificate"]),
                ],
            },
            AreaSpec {
                name: "30-39 Medical",
                description: "Health documents",
                categories: &[
                    ("31 Records", "Medical records", &["medical", "doctor"]),
                    ("32 Insurance", "Health insurance", &["health insurance"]),
                ],
            },
        ],
    },
];

/// All built-in templates.
pub fn list() -> Vec<TemplateInfo> {
    TEMPLATES.iter().map(Template::info).collect()
}

/// Look up a template by key.
pub fn get(key: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.key == key)
}

/// The taxonomy in effect for a library without a taxonomy document.
pub fn default_taxonomy() -> Taxonomy {
    get(DEFAULT_TEMPLATE)
        .map(Template::taxonomy)
        .unwrap_or_default()
}
