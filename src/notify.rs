//! Order notification text. Only builds the message and a `wa.me` link; nothing is sent.

use std::fmt::Write;

use crate::models::ShipmentRequest;

pub fn order_message(order: &ShipmentRequest, tracking_number: &str) -> String {
    let shipping = order.shipping_cost.unwrap_or(0.0);
    let address = &order.destination;
    let locality = [address.city.as_deref(), address.province.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

    let mut message = String::from("🍺 *NUEVO PEDIDO*\n\n");
    let _ = writeln!(message, "*Cliente:* {}", order.customer.name);
    let _ = writeln!(message, "*Teléfono:* {}", order.customer.phone);
    let _ = writeln!(message, "*Email:* {}", order.customer.email);
    message.push_str("\n*Productos:*\n");
    for item in &order.items {
        let _ = writeln!(
            message,
            "- {} x{}: ${}",
            item.name,
            item.quantity,
            money(item.subtotal())
        );
    }
    let _ = writeln!(message, "\n*Envío:* ${}", money(shipping));
    let _ = writeln!(message, "*Total:* ${}", money(order.declared_value() + shipping));
    let _ = writeln!(message, "\n*Dirección:*\n{}", address.line());
    if !locality.is_empty() {
        let _ = writeln!(message, "{locality}");
    }
    let _ = writeln!(message, "CP: {}", address.postal_code);
    let _ = writeln!(
        message,
        "\n*Método de pago:* {}",
        order.payment_method.as_deref().unwrap_or("No especificado")
    );
    let _ = write!(message, "*Tracking:* {tracking_number}");
    message
}

/// `https://wa.me/<digits>?text=<message>`, or `None` when the number has no digits.
pub fn whatsapp_link(number: &str, message: &str) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(message)
    ))
}

// Whole amounts print without decimals.
fn money(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}
