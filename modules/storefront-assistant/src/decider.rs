//! Response decider: the three-way gate between a deterministic reply, a
//! clarification turn, and model generation. No model calls happen here.

use storefront_core::{AssistantSettings, InventoryItem, MAX_CLARIFY_QUESTIONS};

use crate::catalog::{format_price, InventoryFilter, InventorySnapshot};
use crate::types::QueryContext;

/// Marker on every clarifying question so callers can tell a clarification
/// turn from a final answer.
pub const CLARIFY_SENTINEL: &str = "[CLARIFY]";

pub const NO_MATCH_FOLLOW_UPS: [&str; 2] = [
    "¿Quieres que busque una alternativa similar o de otra categoría?",
    "¿Puedes contarme más detalles del producto que buscas (marca, modelo o uso)?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClarifyPolicy {
    pub enabled: bool,
    pub max_questions: usize,
}

impl Default for ClarifyPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_questions: 3,
        }
    }
}

impl ClarifyPolicy {
    /// Policy from the active settings, defaulting when there are none.
    pub fn from_settings(settings: Option<&AssistantSettings>) -> Self {
        settings
            .map(|s| Self {
                enabled: s.clarify_before_recommend,
                max_questions: s.clarify_question_count(),
            })
            .unwrap_or_default()
    }

    pub fn question_count(&self) -> usize {
        self.max_questions.clamp(1, MAX_CLARIFY_QUESTIONS)
    }
}

/// What the shopper has told us, explicitly or in the message itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSignals {
    pub budget: Option<f64>,
    pub intended_use: Option<String>,
    pub brand: Option<String>,
}

impl ContextSignals {
    /// Budget from the context or the message; brand from the context or a
    /// message token naming a brand in the snapshot; use only from the context.
    pub fn resolve(
        context: &QueryContext,
        extracted_budget: Option<f64>,
        tokens: &[String],
        snapshot: &InventorySnapshot,
    ) -> Self {
        let brand = context.brand_preference().map(str::to_string).or_else(|| {
            snapshot
                .brands()
                .into_iter()
                .find(|b| tokens.iter().any(|t| t.eq_ignore_ascii_case(b)))
        });

        Self {
            budget: context.budget().or(extracted_budget),
            intended_use: context.intended_use().map(str::to_string),
            brand,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.budget.is_some() && self.intended_use.is_some() && self.brand.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoMatchReply {
    pub message: String,
    pub follow_up_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClarifyReply {
    /// Intro line followed by one sentinel-tagged numbered line per question.
    pub message: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    NoMatch(NoMatchReply),
    Clarify(ClarifyReply),
    Generate { intent_terms: Vec<String> },
}

impl DecisionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionOutcome::NoMatch(_) => "NO_INVENTORY",
            DecisionOutcome::Clarify(_) => "CLARIFY",
            DecisionOutcome::Generate { .. } => "GENERATE",
        }
    }
}

/// Decide how to answer.
///
/// Empty snapshot: deterministic no-match reply. Otherwise generate, unless
/// the policy is enabled and any of budget, use or brand is missing, in
/// which case ask exactly `policy.question_count()` questions.
pub fn decide(
    snapshot: &InventorySnapshot,
    search_terms: &[String],
    signals: &ContextSignals,
    policy: ClarifyPolicy,
) -> DecisionOutcome {
    if snapshot.is_empty() {
        return DecisionOutcome::NoMatch(no_match_reply(search_terms, signals.budget));
    }

    if policy.enabled && !signals.is_complete() {
        let questions = clarifying_questions(snapshot, search_terms, signals, policy.question_count());
        return DecisionOutcome::Clarify(clarify_reply(snapshot, search_terms, questions));
    }

    DecisionOutcome::Generate {
        intent_terms: search_terms.to_vec(),
    }
}

fn no_match_reply(search_terms: &[String], budget: Option<f64>) -> NoMatchReply {
    let mut message = if search_terms.is_empty() {
        "No encontré productos disponibles que coincidan con tu búsqueda".to_string()
    } else {
        let quoted: Vec<String> = search_terms.iter().map(|t| format!("\"{t}\"")).collect();
        format!(
            "No encontré productos disponibles para {}",
            quoted.join(", ")
        )
    };
    if let Some(budget) = budget {
        message.push_str(&format!(" dentro de un presupuesto de {}", format_price(budget)));
    }
    message.push_str(
        " en nuestro inventario actual. Prefiero no sugerirte algo que no tenemos en stock.",
    );

    NoMatchReply {
        message,
        follow_up_questions: NO_MATCH_FOLLOW_UPS.iter().map(|q| q.to_string()).collect(),
    }
}

fn clarify_reply(
    snapshot: &InventorySnapshot,
    search_terms: &[String],
    questions: Vec<String>,
) -> ClarifyReply {
    let subject = subject(snapshot, search_terms);
    let mut message = format!(
        "Tenemos {} opción(es) de {subject} disponibles. Para recomendarte la mejor, cuéntame:",
        snapshot.len()
    );
    for (i, q) in questions.iter().enumerate() {
        message.push_str(&format!("\n{CLARIFY_SENTINEL} {}. {q}", i + 1));
    }
    ClarifyReply { message, questions }
}

/// What the shopper is looking for: the snapshot category that contains a
/// search term, else the first search term found in a snapshot item, else
/// the first category. Terms that match nothing in stock are never used.
fn subject(snapshot: &InventorySnapshot, search_terms: &[String]) -> String {
    let categories = snapshot.categories();
    categories
        .iter()
        .find(|c| {
            let lower = c.to_lowercase();
            search_terms.iter().any(|t| lower.contains(t.as_str()))
        })
        .cloned()
        .or_else(|| {
            search_terms
                .iter()
                .find(|t| {
                    let filter = InventoryFilter::new(std::slice::from_ref(*t), None);
                    snapshot.items.iter().any(|item| filter.mentions(item))
                })
                .cloned()
        })
        .or_else(|| categories.first().cloned())
        .unwrap_or_else(|| "producto".to_string())
}

/// Questions in priority order: missing signals first, then attributes of
/// the snapshot. Every question names the subject.
fn clarifying_questions(
    snapshot: &InventorySnapshot,
    search_terms: &[String],
    signals: &ContextSignals,
    count: usize,
) -> Vec<String> {
    let subject = subject(snapshot, search_terms);
    let mut questions = Vec::with_capacity(8);

    if signals.budget.is_none() {
        questions.push(match snapshot.price_range() {
            Some((lo, hi)) if lo < hi => format!(
                "¿Cuál es tu presupuesto aproximado para {subject}? Las opciones disponibles van de {} a {}.",
                format_price(lo),
                format_price(hi)
            ),
            Some((price, _)) => format!(
                "¿Cuál es tu presupuesto aproximado para {subject}? La opción disponible cuesta {}.",
                format_price(price)
            ),
            None => format!("¿Cuál es tu presupuesto aproximado para {subject}?"),
        });
    }

    if signals.intended_use.is_none() {
        questions.push(format!(
            "¿Para qué usarás principalmente {subject}: trabajo, estudio, entretenimiento u otro uso?"
        ));
    }

    if signals.brand.is_none() {
        let brands = snapshot.brands();
        questions.push(if brands.is_empty() {
            format!("¿Tienes alguna marca preferida para {subject}?")
        } else {
            format!(
                "¿Tienes preferencia de marca para {subject}? En stock tenemos {}.",
                brands.join(", ")
            )
        });
    }

    questions.push(format!(
        "¿Qué especificaciones o capacidad necesitas en {subject} (memoria, almacenamiento, tamaño o potencia)?"
    ));
    questions.push(format!(
        "¿Necesitas que {subject} sea compatible con algún equipo o sistema que ya tengas?"
    ));
    questions.push(format!(
        "¿Te interesa incluir accesorios junto con {subject}?"
    ));
    questions.push(format!(
        "Hay {} modelo(s) de {subject} en stock: {}. ¿Alguno te llamó la atención?",
        snapshot.len(),
        model_names(&snapshot.items, 3)
    ));
    questions.push(format!(
        "¿Cuántas unidades de {subject} necesitas? Tenemos hasta {} en stock por modelo.",
        snapshot.items.iter().map(|i| i.stock).max().unwrap_or(0)
    ));

    questions.truncate(count);
    questions
}

fn model_names(items: &[InventoryItem], limit: usize) -> String {
    let mut names: Vec<&str> = items.iter().take(limit).map(|i| i.name.as_str()).collect();
    if items.len() > limit {
        names.push("entre otros");
    }
    names.join(", ")
}
