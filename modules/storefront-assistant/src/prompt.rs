//! Prompt builder: the grounding instruction block sent as the system
//! prompt. Provider-agnostic text.

use std::fmt::Write;

use crate::catalog::{format_price, InventorySnapshot, INVENTORY_LIMIT};
use crate::decider::CLARIFY_SENTINEL;

#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub snapshot: &'a InventorySnapshot,
    pub intent_terms: &'a [String],
    pub user_message: &'a str,
    pub first_turn: bool,
    /// Number of clarifying questions when the clarification policy is on.
    pub clarify_questions: Option<usize>,
    pub budget: Option<f64>,
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str(
        "Eres el asistente de compras de una tienda en línea. Hablas en español, con un tono \
         cercano, claro y profesional. Tu objetivo es ayudar al cliente a elegir entre los \
         productos que realmente tenemos disponibles.\n\n",
    );

    push_rules(&mut out, input);

    if let Some(n) = input.clarify_questions {
        push_clarification(&mut out, n, input.intent_terms);
    }

    push_inventory(&mut out, input.snapshot);

    out.push_str(
        "\nESTRUCTURA DE LA RESPUESTA:\n\
         1. Reconoce brevemente lo que busca el cliente.\n\
         2. Sugiere de 1 a 3 opciones concretas del inventario, con el motivo de cada una.\n\
         3. Si algo de lo pedido no está disponible, dilo y ofrece alternativas de la lista.\n\
         4. Termina con una sola pregunta útil para avanzar.\n",
    );

    let _ = write!(out, "\nMENSAJE DEL CLIENTE:\n{}", input.user_message);
    out
}

fn push_rules(out: &mut String, input: &PromptInput<'_>) {
    out.push_str("REGLAS OBLIGATORIAS:\n");
    out.push_str("- Usa solo los productos del INVENTARIO DISPONIBLE listado abajo.\n");
    out.push_str(
        "- Nunca inventes cantidades, modelos, precios ni características que no aparezcan en la lista.\n",
    );
    out.push_str(
        "- Si el inventario está vacío o nada coincide, dilo con claridad y no recomiendes nada.\n",
    );
    out.push_str("- No ofrezcas alternativas que no estén en la lista.\n");
    out.push_str(
        "- Si falta el presupuesto, el uso previsto o la preferencia de marca, pregúntalo.\n",
    );
    out.push_str("- Da cifras concretas solo si están en el inventario.\n");

    if input.first_turn {
        out.push_str("- Es el primer mensaje de la conversación: puedes saludar una vez.\n");
    } else {
        out.push_str("- La conversación ya empezó: no vuelvas a saludar.\n");
    }

    if input.snapshot.budget_relaxed {
        if let Some(budget) = input.budget {
            let _ = writeln!(
                out,
                "- Ningún producto entra en el presupuesto de {}: las opciones listadas lo superan y debes decirlo explícitamente.",
                format_price(budget)
            );
        }
    } else if let Some(budget) = input.snapshot.applied_budget {
        let _ = writeln!(
            out,
            "- El cliente indicó un presupuesto máximo de {}; todas las opciones listadas lo respetan.",
            format_price(budget)
        );
    }
    out.push('\n');
}

fn push_clarification(out: &mut String, n: usize, intent_terms: &[String]) {
    let intent = if intent_terms.is_empty() {
        "lo que busca el cliente".to_string()
    } else {
        intent_terms.join(", ")
    };
    let _ = writeln!(out, "ACLARACIÓN ANTES DE RECOMENDAR:");
    let _ = writeln!(
        out,
        "- Si la solicitud es ambigua, antes de recomendar haz exactamente {n} preguntas numeradas \
         (1 a {n}) para precisar la necesidad sobre: {intent}."
    );
    let _ = writeln!(
        out,
        "- Empieza cada pregunta con la marca {CLARIFY_SENTINEL} y basa cada una en atributos del \
         inventario (especificaciones, capacidad, compatibilidad, accesorios o uso principal)."
    );
    out.push_str("- No uses preguntas genéricas de relleno.\n\n");
}

fn push_inventory(out: &mut String, snapshot: &InventorySnapshot) {
    out.push_str("RESUMEN DEL INVENTARIO:\n");
    if snapshot.is_empty() {
        out.push_str("- No hay productos disponibles para esta búsqueda.\n");
    } else {
        let _ = writeln!(out, "- Productos encontrados: {}", snapshot.len());
        let brands: Vec<String> = snapshot
            .brand_counts()
            .into_iter()
            .map(|(brand, count)| format!("{brand} ({count})"))
            .collect();
        let _ = writeln!(out, "- Marcas: {}", brands.join(", "));
    }

    out.push_str("\nINVENTARIO DISPONIBLE:\n");
    for item in snapshot.items.iter().take(INVENTORY_LIMIT) {
        let _ = writeln!(
            out,
            "- {} | Marca: {} | Categoría: {} | Precio: {} | Stock: {} | SKU: {}",
            item.name,
            item.brand.as_deref().unwrap_or("Sin marca"),
            item.category.as_deref().unwrap_or("Sin categoría"),
            format_price(item.price),
            item.stock,
            item.sku
        );
    }
}
