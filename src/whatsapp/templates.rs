use crate::models::outbox::MessageTemplate;

/// Renders a [`MessageTemplate`] to the Portuguese-language text actually
/// sent over WhatsApp. Text is produced in-memory at send time only and
/// never persisted — the persisted form is always the tagged
/// `MessageTemplate` variant.
pub fn render(template: &MessageTemplate) -> String {
    match template {
        MessageTemplate::ReservationConfirmed {
            guest_name,
            property_name,
            checkin,
            checkout,
        } => {
            let greeting = guest_name
                .as_deref()
                .map(|name| format!("{name}, sua"))
                .unwrap_or_else(|| "Sua".to_string());
            format!(
                "{greeting} reserva em {property_name} está confirmada: {} a {}.",
                checkin.format("%d/%m"),
                checkout.format("%d/%m")
            )
        }
        MessageTemplate::PromptCheckin => {
            "Por favor, informe as datas de entrada e saída (ex: 10/02 a 12/02).".to_string()
        }
        MessageTemplate::PromptCheckout => {
            "Qual a data de saída?".to_string()
        }
        MessageTemplate::PromptRoomType => {
            "Qual tipo de quarto prefere?".to_string()
        }
        MessageTemplate::PromptAdultCount => "Quantos adultos serão?".to_string(),
        MessageTemplate::PromptChildrenAges => {
            "Quais as idades das crianças? (ex.: 3 e 7). Se não houver crianças, responda 0.".to_string()
        }
        MessageTemplate::QuoteReady {
            room_type_name,
            checkin,
            checkout,
            total_cents,
            currency,
        } => {
            let nights = (*checkout - *checkin).num_days().max(0);
            format!(
                "Ótimo! Encontrei disponibilidade:\n- {room_type_name}, {nights} noite(s) de {} a {}\n- Total: {}\n\nReserva válida por 15 minutos.",
                checkin.format("%d/%m"),
                checkout.format("%d/%m"),
                format_amount(*total_cents, currency)
            )
        }
        MessageTemplate::Unavailable => {
            "Infelizmente não temos disponibilidade para essas datas. Gostaria de tentar outras?".to_string()
        }
    }
}

fn format_amount(total_cents: i64, currency: &str) -> String {
    let whole = total_cents / 100;
    let fraction = (total_cents % 100).abs();
    let symbol = match currency.to_uppercase().as_str() {
        "BRL" => "R$",
        "USD" => "US$",
        "PYG" => "₲",
        other => other,
    };
    format!("{symbol} {whole},{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn renders_quote_ready_with_formatted_total() {
        let template = MessageTemplate::QuoteReady {
            room_type_name: "Suíte".to_string(),
            checkin: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            checkout: NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(),
            total_cents: 45050,
            currency: "BRL".to_string(),
        };
        let text = render(&template);
        assert!(text.contains("R$ 450,50"));
        assert!(text.contains("2 noite"));
    }

    #[test]
    fn renders_reservation_confirmed_without_guest_name() {
        let template = MessageTemplate::ReservationConfirmed {
            guest_name: None,
            property_name: "Pousada Azul".to_string(),
            checkin: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            checkout: NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(),
        };
        assert_eq!(
            render(&template),
            "Sua reserva em Pousada Azul está confirmada: 10/08 a 12/08."
        );
    }
}
