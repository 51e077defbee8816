//! Cart line items and the cart itself.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s keyed by product ID. Edits
//! never touch the receiver: `with_item`, `with_amount` and `without` each
//! return a new cart, so a committed cart can be shared freely while an
//! operation builds its replacement.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// Errors produced when editing or decoding a cart.
#[derive(Debug, Error)]
pub enum CartEditError {
    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),

    /// The product is already in the cart.
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),

    /// Cart lines must hold at least one unit.
    #[error("product {0} has a zero amount")]
    ZeroAmount(ProductId),

    /// The serialized cart is not valid JSON for a list of items.
    #[error("malformed cart: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One product in the cart with the desired quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    pub amount: u32,
}

impl CartItem {
    /// Build a cart line from a catalog product.
    ///
    /// A catalog `amount` attribute, if any, is dropped so it cannot shadow
    /// the line quantity when serialized.
    #[must_use]
    pub fn from_product(product: Product, amount: u32) -> Self {
        let Product {
            id,
            title,
            price,
            image,
            mut attributes,
        } = product;
        attributes.remove("amount");

        Self {
            id,
            title,
            price,
            image,
            attributes,
            amount,
        }
    }

    /// A copy of this line with a different quantity.
    #[must_use]
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// Totals shown alongside the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    /// Sum of all line amounts.
    pub item_count: u32,
    /// Sum of all line subtotals.
    pub subtotal: Price,
}

/// An ordered collection of cart lines with unique product IDs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from items, checking ID uniqueness and amounts.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` if two items share an ID, or `ZeroAmount` if
    /// any item has an amount of zero.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartEditError> {
        let cart = Self { items };
        cart.validate()?;
        Ok(cart)
    }

    /// Decode a cart from its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` for invalid JSON and the `from_items` errors for
    /// a list that breaks the cart invariants.
    pub fn from_json(json: &str) -> Result<Self, CartEditError> {
        let items: Vec<CartItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    /// Encode the cart as a JSON array of items.
    ///
    /// # Errors
    ///
    /// Returns an error if an item fails to serialize.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// The cart lines in order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over the cart lines.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by product ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Quantity of a product in the cart, zero when absent.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// A new cart with `item` appended.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` if the product is already present, or
    /// `ZeroAmount` if the item has no units.
    pub fn with_item(&self, item: CartItem) -> Result<Self, CartEditError> {
        if self.get(item.id).is_some() {
            return Err(CartEditError::DuplicateItem(item.id));
        }
        if item.amount == 0 {
            return Err(CartEditError::ZeroAmount(item.id));
        }

        let mut items = self.items.clone();
        items.push(item);
        Ok(Self { items })
    }

    /// A new cart with the amount of one line replaced.
    ///
    /// Only the edited line is rebuilt; the others keep their position.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the product is absent, or `ZeroAmount` if
    /// `amount` is zero.
    pub fn with_amount(&self, id: ProductId, amount: u32) -> Result<Self, CartEditError> {
        if amount == 0 {
            return Err(CartEditError::ZeroAmount(id));
        }
        let position = self.position(id)?;

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if index == position {
                    item.with_amount(amount)
                } else {
                    item.clone()
                }
            })
            .collect();
        Ok(Self { items })
    }

    /// A new cart without the given product.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the product is absent.
    pub fn without(&self, id: ProductId) -> Result<Self, CartEditError> {
        let position = self.position(id)?;

        let items = self
            .items
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != position)
            .map(|(_, item)| item.clone())
            .collect();
        Ok(Self { items })
    }

    /// Item count and subtotal.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            item_count: self
                .items
                .iter()
                .fold(0_u32, |count, item| count.saturating_add(item.amount)),
            subtotal: self.items.iter().map(CartItem::subtotal).sum(),
        }
    }

    fn position(&self, id: ProductId) -> Result<usize, CartEditError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CartEditError::ItemNotFound(id))
    }

    fn validate(&self) -> Result<(), CartEditError> {
        for (index, item) in self.items.iter().enumerate() {
            if item.amount == 0 {
                return Err(CartEditError::ZeroAmount(item.id));
            }
            if self.items.iter().skip(index + 1).any(|other| other.id == item.id) {
                return Err(CartEditError::DuplicateItem(item.id));
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartEditError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Shoe {id}"),
            price: Price::from_cents(cents),
            image: Some(format!("https://example.com/{id}.jpg")),
            attributes: Map::new(),
        }
    }

    fn cart_of(lines: &[(i32, u32)]) -> Cart {
        let items = lines
            .iter()
            .map(|&(id, amount)| CartItem::from_product(product(id, 1000), amount))
            .collect();
        Cart::from_items(items).unwrap()
    }

    #[test]
    fn test_from_product_drops_catalog_amount() {
        let mut catalog = product(1, 17990);
        catalog
            .attributes
            .insert("amount".to_string(), Value::from(99));
        catalog
            .attributes
            .insert("brand".to_string(), Value::from("Rocket"));

        let item = CartItem::from_product(catalog, 1);
        assert_eq!(item.amount, 1);
        assert!(!item.attributes.contains_key("amount"));
        assert!(item.attributes.contains_key("brand"));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["amount"], Value::from(1));
    }

    #[test]
    fn test_with_item_appends() {
        let cart = cart_of(&[(1, 1)]);
        let updated = cart
            .with_item(CartItem::from_product(product(2, 500), 1))
            .unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated.items()[1].id, ProductId::new(2));
    }

    #[test]
    fn test_with_item_rejects_duplicate() {
        let cart = cart_of(&[(1, 1)]);
        let result = cart.with_item(CartItem::from_product(product(1, 500), 1));
        assert!(matches!(result, Err(CartEditError::DuplicateItem(id)) if id == ProductId::new(1)));
    }

    #[test]
    fn test_with_amount_leaves_original_untouched() {
        let cart = cart_of(&[(1, 1), (2, 2), (3, 3)]);
        let updated = cart.with_amount(ProductId::new(2), 5).unwrap();

        assert_eq!(cart.amount_of(ProductId::new(2)), 2);
        assert_eq!(updated.amount_of(ProductId::new(2)), 5);

        let ids: Vec<i32> = updated.iter().map(|item| item.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(updated.items()[0], cart.items()[0]);
        assert_eq!(updated.items()[2], cart.items()[2]);
    }

    #[test]
    fn test_with_amount_missing_and_zero() {
        let cart = cart_of(&[(1, 1)]);
        assert!(matches!(
            cart.with_amount(ProductId::new(9), 2),
            Err(CartEditError::ItemNotFound(_))
        ));
        assert!(matches!(
            cart.with_amount(ProductId::new(1), 0),
            Err(CartEditError::ZeroAmount(_))
        ));
    }

    #[test]
    fn test_without_removes_only_target() {
        let cart = cart_of(&[(1, 1), (2, 2), (3, 3)]);
        let updated = cart.without(ProductId::new(2)).unwrap();

        let ids: Vec<i32> = updated.iter().map(|item| item.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(matches!(
            updated.without(ProductId::new(2)),
            Err(CartEditError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_items() {
        let mut shoe = product(1, 17990);
        shoe.attributes
            .insert("brand".to_string(), Value::from("Rocket"));
        let cart = Cart::new()
            .with_item(CartItem::from_product(shoe, 2))
            .unwrap()
            .with_item(CartItem::from_product(product(2, 13990), 1))
            .unwrap();

        let json = cart.to_json().unwrap();
        let restored = Cart::from_json(&json).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_from_json_reads_catalog_shaped_items() {
        let json = r#"[{"id":1,"title":"Tênis","price":179.9,"image":"a.jpg","amount":2}]"#;
        let cart = Cart::from_json(json).unwrap();

        let item = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(item.amount, 2);
        assert_eq!(item.price, Price::from_cents(17990));
        assert!(item.attributes.is_empty());
    }

    #[test]
    fn test_from_json_rejects_invalid_carts() {
        assert!(matches!(
            Cart::from_json("not json"),
            Err(CartEditError::Malformed(_))
        ));
        assert!(matches!(
            Cart::from_json(r#"[{"id":1,"title":"a","price":1,"amount":1},{"id":1,"title":"a","price":1,"amount":1}]"#),
            Err(CartEditError::DuplicateItem(_))
        ));
        assert!(matches!(
            Cart::from_json(r#"[{"id":1,"title":"a","price":1,"amount":0}]"#),
            Err(CartEditError::ZeroAmount(_))
        ));
    }

    #[test]
    fn test_serde_deserialize_validates() {
        let result = serde_json::from_str::<Cart>(
            r#"[{"id":1,"title":"a","price":1,"amount":1},{"id":1,"title":"a","price":1,"amount":1}]"#,
        );
        assert!(result.is_err());

        let cart: Cart =
            serde_json::from_str(r#"[{"id":1,"title":"a","price":1,"amount":1}]"#).unwrap();
        assert_eq!(serde_json::to_string(&cart).unwrap(), cart.to_json().unwrap());
    }

    #[test]
    fn test_summary() {
        let cart = Cart::new()
            .with_item(CartItem::from_product(product(1, 17990), 2))
            .unwrap()
            .with_item(CartItem::from_product(product(2, 13990), 1))
            .unwrap();

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, Price::from_cents(49970));
        assert_eq!(Cart::new().summary(), CartSummary::default());
    }
}
