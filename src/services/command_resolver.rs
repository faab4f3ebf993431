//! Command Resolver
//!
//! Turns the text of a chat command into a reply. Payment and delivery
//! commands list the tenant's active reference entries; the product command
//! looks up one catalog offer and answers with a product card.

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CommandKind, MessageCost, MessageProduct, MessageQuantity, Offer, ParsedCommand, ProductFilter,
};
use crate::domain::ports::CommerceClient;
use crate::infrastructure::localization::Localizer;

/// Maximum length of a text reply, in characters.
pub const MAX_REPLY_CHARS: usize = 2000;

/// Keycap glyph per decimal digit. Each carries its own trailing space.
const DIGIT_GLYPHS: [&str; 10] = [
    "0\u{fe0f}\u{20e3} ",
    "1\u{fe0f}\u{20e3} ",
    "2\u{fe0f}\u{20e3} ",
    "3\u{fe0f}\u{20e3} ",
    "4\u{fe0f}\u{20e3} ",
    "5\u{fe0f}\u{20e3} ",
    "6\u{fe0f}\u{20e3} ",
    "7\u{fe0f}\u{20e3} ",
    "8\u{fe0f}\u{20e3} ",
    "9\u{fe0f}\u{20e3} ",
];

/// Outcome of resolving one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to send.
    None,
    Text(String),
    Product(MessageProduct),
}

/// Split a message into a known command and its parameter.
///
/// The first whitespace-separated token must equal a command code. For the
/// product command the remainder after one separator character is the
/// filter, taken verbatim.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let token = text.split(char::is_whitespace).next()?;
    let kind = CommandKind::from_code(token)?;

    let filter = match kind {
        CommandKind::Product => {
            let mut rest = text[token.len()..].chars();
            rest.next();
            rest.as_str().to_string()
        }
        CommandKind::Payment | CommandKind::Delivery => String::new(),
    };

    Some(ParsedCommand { kind, filter })
}

/// Ordinal prefix for list position `index` (zero based): the digits of
/// `index + 1`, each rendered as a keycap glyph.
pub fn ordinal(index: usize) -> String {
    (index + 1)
        .to_string()
        .bytes()
        .map(|digit| DIGIT_GLYPHS[usize::from(digit - b'0')])
        .collect()
}

/// Hard cut to [`MAX_REPLY_CHARS`] characters.
pub fn truncate_reply(mut text: String) -> String {
    if let Some((cut, _)) = text.char_indices().nth(MAX_REPLY_CHARS) {
        text.truncate(cut);
    }
    text
}

/// Pick the offer matching `filter` by article, then by name, else the first.
pub fn select_offer<'a>(offers: &'a [Offer], filter: &str) -> Option<&'a Offer> {
    offers
        .iter()
        .find(|o| o.article == filter)
        .or_else(|| offers.iter().find(|o| o.name == filter))
        .or_else(|| offers.first())
}

/// Render a list of entry names under a localized header.
fn format_list(header: &str, names: &[String]) -> String {
    let body = if let [single] = names {
        single.clone()
    } else {
        names
            .iter()
            .enumerate()
            .map(|(k, name)| format!("{} {name}", ordinal(k)))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("{header}\n\n{body}")
}

/// Resolve `text` against the tenant's commerce backend.
///
/// Commerce errors are returned as-is; nothing partial is produced.
pub async fn resolve(
    text: &str,
    currency: &str,
    localizer: &Localizer,
    commerce: &dyn CommerceClient,
) -> DomainResult<Reply> {
    let Some(command) = parse_command(text) else {
        return Ok(Reply::None);
    };

    let reply = match command.kind {
        CommandKind::Payment => {
            let names: Vec<String> = commerce
                .payment_types()
                .await?
                .into_iter()
                .filter(|t| t.active)
                .map(|t| t.name)
                .collect();
            list_reply(localizer, "payment_options", &names)
        }
        CommandKind::Delivery => {
            let names: Vec<String> = commerce
                .delivery_types()
                .await?
                .into_iter()
                .filter(|t| t.active)
                .map(|t| t.name)
                .collect();
            list_reply(localizer, "delivery_options", &names)
        }
        CommandKind::Product => {
            if command.filter.is_empty() {
                Reply::Text(localizer.localize("set_name_or_article"))
            } else {
                product_reply(&command.filter, currency, commerce).await?
            }
        }
    };

    Ok(match reply {
        Reply::Text(text) => Reply::Text(truncate_reply(text)),
        other => other,
    })
}

fn list_reply(localizer: &Localizer, header_key: &str, names: &[String]) -> Reply {
    if names.is_empty() {
        return Reply::Text(localizer.localize("not_found"));
    }
    Reply::Text(format_list(&localizer.localize(header_key), names))
}

async fn product_reply(filter: &str, currency: &str, commerce: &dyn CommerceClient) -> DomainResult<Reply> {
    let products = commerce.products(&ProductFilter::by_name(filter)).await?;

    let found = products
        .iter()
        .filter(|p| p.active)
        .find_map(|p| select_offer(&p.offers, filter).map(|offer| (p, offer)));

    let Some((product, offer)) = found else {
        return Ok(Reply::None);
    };

    let img = offer
        .images
        .first()
        .cloned()
        .unwrap_or_else(|| product.image_url.clone());

    let quantity = (product.quantity > 0.0).then(|| MessageQuantity {
        value: product.quantity,
        unit: offer.unit.sym.clone(),
    });

    Ok(Reply::Product(MessageProduct {
        id: offer.id,
        name: offer.name.clone(),
        article: offer.article.clone(),
        url: product.url.clone(),
        img,
        cost: MessageCost {
            value: offer.price,
            currency: currency.to_string(),
        },
        quantity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockCommerceClient;
    use crate::domain::models::{DeliveryType, PaymentType, Product, Unit};
    use crate::infrastructure::localization::Translations;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn localizer() -> Localizer {
        Arc::new(Translations::embedded("en").unwrap()).localizer("en")
    }

    fn offer(id: u64, article: &str, name: &str) -> Offer {
        Offer {
            id,
            name: name.to_string(),
            article: article.to_string(),
            price: 10.0,
            ..Offer::default()
        }
    }

    fn payment(name: &str, active: bool) -> PaymentType {
        PaymentType {
            code: name.to_lowercase(),
            name: name.to_string(),
            active,
        }
    }

    #[test]
    fn test_parse_command() {
        let parsed = parse_command("/product wrench 10").unwrap();
        assert_eq!(parsed.kind, CommandKind::Product);
        assert_eq!(parsed.filter, "wrench 10");

        assert_eq!(parse_command("/product").unwrap().filter, "");
        assert_eq!(parse_command("/payment now").unwrap().filter, "");
        assert_eq!(parse_command("/payments"), None);
        assert_eq!(parse_command("hello /payment"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_ordinal_glyphs() {
        assert_eq!(ordinal(0), "1\u{fe0f}\u{20e3} ");
        assert_eq!(ordinal(9), "1\u{fe0f}\u{20e3} 0\u{fe0f}\u{20e3} ");
    }

    #[test]
    fn test_select_offer_tie_break() {
        let offers = vec![offer(1, "A1", "Wrench"), offer(2, "X", "Bolt")];
        assert_eq!(select_offer(&offers, "X").map(|o| o.id), Some(2));
        assert_eq!(select_offer(&offers, "Bolt").map(|o| o.id), Some(2));
        assert_eq!(select_offer(&offers, "zzz").map(|o| o.id), Some(1));
        assert_eq!(select_offer(&[], "zzz"), None);
    }

    #[test]
    fn test_truncate_exact_length() {
        let long = "a".repeat(MAX_REPLY_CHARS + 1);
        let cut = truncate_reply(long.clone());
        assert_eq!(cut.len(), MAX_REPLY_CHARS);
        assert_eq!(cut, long[..MAX_REPLY_CHARS]);
    }

    proptest! {
        #[test]
        fn prop_truncate_is_prefix_and_bounded(s in "\\PC{0,2100}") {
            let cut = truncate_reply(s.clone());
            prop_assert!(cut.chars().count() <= MAX_REPLY_CHARS);
            prop_assert!(s.starts_with(&cut));
            if s.chars().count() <= MAX_REPLY_CHARS {
                prop_assert_eq!(&cut, &s);
            }
        }
    }

    #[tokio::test]
    async fn test_empty_product_filter_skips_catalog() {
        let commerce = MockCommerceClient::new();
        let reply = resolve("/product", "usd", &localizer(), &commerce).await.unwrap();

        assert_eq!(reply, Reply::Text("Set the product name or article, for example: /product T-shirt".to_string()));
        assert!(commerce.product_queries().is_empty());
    }

    #[tokio::test]
    async fn test_product_query_uses_filter_once() {
        let commerce = MockCommerceClient::new();
        let reply = resolve("/product wrench", "usd", &localizer(), &commerce).await.unwrap();

        assert_eq!(reply, Reply::None);
        assert_eq!(commerce.product_queries(), vec!["wrench".to_string()]);
    }

    #[tokio::test]
    async fn test_product_card() {
        let mut chosen = offer(22, "W10", "Wrench 10");
        chosen.images = vec!["https://img/offer.png".to_string()];
        chosen.unit = Unit {
            sym: "pcs".to_string(),
            ..Unit::default()
        };
        let commerce = MockCommerceClient::new().with_products(vec![
            Product {
                id: 1,
                name: "Inactive".to_string(),
                active: false,
                offers: vec![offer(11, "W10", "Old")],
                ..Product::default()
            },
            Product {
                id: 2,
                name: "Wrench".to_string(),
                active: true,
                url: "https://shop/wrench".to_string(),
                image_url: "https://img/product.png".to_string(),
                quantity: 4.0,
                offers: vec![offer(21, "W8", "Wrench 8"), chosen],
            },
        ]);

        let reply = resolve("/product W10", "eur", &localizer(), &commerce).await.unwrap();
        let Reply::Product(product) = reply else {
            panic!("expected a product card, got {reply:?}");
        };
        assert_eq!(product.id, 22);
        assert_eq!(product.img, "https://img/offer.png");
        assert_eq!(product.url, "https://shop/wrench");
        assert_eq!(product.cost.currency, "eur");
        assert_eq!(product.quantity.map(|q| q.unit), Some("pcs".to_string()));
    }

    #[tokio::test]
    async fn test_product_without_stock_or_offer_image() {
        let commerce = MockCommerceClient::new().with_products(vec![Product {
            id: 2,
            active: true,
            image_url: "https://img/product.png".to_string(),
            offers: vec![offer(21, "W8", "Wrench 8")],
            ..Product::default()
        }]);

        let Reply::Product(product) = resolve("/product x", "usd", &localizer(), &commerce).await.unwrap() else {
            panic!("expected a product card");
        };
        assert_eq!(product.img, "https://img/product.png");
        assert!(product.quantity.is_none());
    }

    #[tokio::test]
    async fn test_products_without_offers_are_skipped() {
        let commerce = MockCommerceClient::new().with_products(vec![
            Product {
                id: 1,
                active: true,
                ..Product::default()
            },
            Product {
                id: 2,
                active: true,
                offers: vec![offer(5, "A", "B")],
                ..Product::default()
            },
        ]);

        let reply = resolve("/product A", "usd", &localizer(), &commerce).await.unwrap();
        assert!(matches!(reply, Reply::Product(p) if p.id == 5));
    }

    #[tokio::test]
    async fn test_payment_single_entry() {
        let commerce = MockCommerceClient::new()
            .with_payment_types(vec![payment("Cash", true), payment("Card", false)]);

        let reply = resolve("/payment", "usd", &localizer(), &commerce).await.unwrap();
        assert_eq!(reply, Reply::Text("Payment options:\n\nCash".to_string()));
    }

    #[tokio::test]
    async fn test_payment_multiple_entries_keep_order() {
        let commerce = MockCommerceClient::new()
            .with_payment_types(vec![payment("Cash", true), payment("Card", false), payment("Wire", true)]);

        let reply = resolve("/payment", "usd", &localizer(), &commerce).await.unwrap();
        let expected = format!("Payment options:\n\n{}  Cash\n{}  Wire", "1\u{fe0f}\u{20e3}", "2\u{fe0f}\u{20e3}");
        assert_eq!(reply, Reply::Text(expected));
    }

    #[tokio::test]
    async fn test_delivery_none_active_is_not_found() {
        let commerce = MockCommerceClient::new().with_delivery_types(vec![DeliveryType {
            code: "courier".to_string(),
            name: "Courier".to_string(),
            active: false,
        }]);

        let reply = resolve("/delivery", "usd", &localizer(), &commerce).await.unwrap();
        assert_eq!(reply, Reply::Text("Nothing found".to_string()));
    }

    #[tokio::test]
    async fn test_long_list_is_truncated() {
        let types: Vec<_> = (0..300).map(|i| payment(&format!("Method number {i}"), true)).collect();
        let commerce = MockCommerceClient::new().with_payment_types(types);

        let Reply::Text(text) = resolve("/payment", "usd", &localizer(), &commerce).await.unwrap() else {
            panic!("expected text");
        };
        assert_eq!(text.chars().count(), MAX_REPLY_CHARS);
    }

    #[tokio::test]
    async fn test_unknown_command_is_empty() {
        let commerce = MockCommerceClient::new();
        let reply = resolve("/help", "usd", &localizer(), &commerce).await.unwrap();
        assert_eq!(reply, Reply::None);
        assert_eq!(commerce.reference_calls(), 0);
    }

    #[tokio::test]
    async fn test_commerce_error_short_circuits() {
        let commerce = MockCommerceClient::new();
        commerce.fail_with("Wrong apiKey value");
        assert!(resolve("/delivery", "usd", &localizer(), &commerce).await.is_err());
    }
}
