use super::sendmail::send_email;
use crate::dtos::CartItemDto;

pub async fn send_cart_email(
    store_email: &str,
    customer_email: &str,
    customer_name: Option<&str>,
    items: &[CartItemDto],
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Nueva consulta de carrito";
    let body = build_cart_body(customer_email, customer_name, items);

    send_email(store_email, customer_email, subject, body).await
}

pub async fn send_contact_email(
    store_email: &str,
    customer_email: &str,
    customer_name: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Nuevo mensaje de contacto";
    let body = format!(
        "Mensaje de contacto\n\nNombre: {}\nEmail: {}\n\n{}\n",
        customer_name, customer_email, message
    );

    send_email(store_email, customer_email, subject, body).await
}

pub async fn send_order_email(
    store_email: &str,
    customer_email: &str,
    customer_name: &str,
    phone: Option<&str>,
    items: &[CartItemDto],
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Nuevo pedido";
    let body = build_order_body(customer_email, customer_name, phone, items);

    send_email(store_email, customer_email, subject, body).await
}

fn build_cart_body(
    customer_email: &str,
    customer_name: Option<&str>,
    items: &[CartItemDto],
) -> String {
    let mut body = String::from("Consulta de carrito\n\n");
    if let Some(name) = customer_name {
        body.push_str(&format!("Nombre: {}\n", name));
    }
    body.push_str(&format!("Email: {}\n\n", customer_email));
    body.push_str(&item_lines(items));
    body.push_str(&format!("\nTotal: ${:.2}\n", order_total(items)));
    body
}

fn build_order_body(
    customer_email: &str,
    customer_name: &str,
    phone: Option<&str>,
    items: &[CartItemDto],
) -> String {
    let mut body = String::from("Pedido\n\n");
    body.push_str(&format!("Nombre: {}\n", customer_name));
    body.push_str(&format!("Email: {}\n", customer_email));
    if let Some(phone) = phone {
        body.push_str(&format!("Teléfono: {}\n", phone));
    }
    body.push('\n');
    body.push_str(&item_lines(items));
    body.push_str(&format!("\nTotal: ${:.2}\n", order_total(items)));
    body
}

fn item_lines(items: &[CartItemDto]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- {} x{} (${:.2} c/u)\n",
                item.name, item.quantity, item.price
            )
        })
        .collect()
}

fn order_total(items: &[CartItemDto]) -> f64 {
    items
        .iter()
        .map(|item| item.price * item.quantity as f64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<CartItemDto> {
        vec![
            CartItemDto {
                name: "Casco táctico".to_string(),
                quantity: 2,
                price: 150.0,
            },
            CartItemDto {
                name: "Guantes".to_string(),
                quantity: 1,
                price: 35.5,
            },
        ]
    }

    #[test]
    fn cart_body_lists_items_and_total() {
        let body = build_cart_body("buyer@gmail.com", Some("Ana"), &sample_items());
        assert!(body.contains("Nombre: Ana"));
        assert!(body.contains("Email: buyer@gmail.com"));
        assert!(body.contains("- Casco táctico x2 ($150.00 c/u)"));
        assert!(body.contains("- Guantes x1 ($35.50 c/u)"));
        assert!(body.contains("Total: $335.50"));
    }

    #[test]
    fn cart_body_omits_missing_name() {
        let body = build_cart_body("buyer@gmail.com", None, &sample_items());
        assert!(!body.contains("Nombre:"));
    }

    #[test]
    fn order_body_includes_phone_when_present() {
        let body =
            build_order_body("buyer@gmail.com", "Ana", Some("+54 11 5555-5555"), &sample_items());
        assert!(body.contains("Teléfono: +54 11 5555-5555"));
    }

    #[test]
    fn order_total_sums_quantities() {
        assert_eq!(order_total(&sample_items()), 335.5);
    }
}
