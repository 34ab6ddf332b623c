use chrono::{DateTime, Utc};
use std::fmt;

use prep_core::model::UserId;
use tracing::info;

use crate::Clock;
use crate::error::StoreError;

/// A plan offered in the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    pub price_cents: u32,
    pub features: &'static [&'static str],
}

/// Money in cents, shown as `R$ 297.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brl(pub u32);

impl fmt::Display for Brl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {}.{:02}", self.0 / 100, self.0 % 100)
    }
}

static PRODUCTS: [Product; 3] = [
    Product {
        id: "p1",
        name: "Plano Anual Diamante",
        price_cents: 29_700,
        features: &[
            "Banco de Questões Ilimitado",
            "Todas as Videoaulas",
            "Monitoria Personalizada",
            "Ranking VIP",
        ],
    },
    Product {
        id: "p2",
        name: "Combo Polícia Federal",
        price_cents: 14_700,
        features: &[
            "Foco total em Edital PF",
            "Mapas Mentais",
            "Simulados Estilo Cespe",
        ],
    },
    Product {
        id: "p3",
        name: "Pack 500 Questões Comentadas",
        price_cents: 4_700,
        features: &["Acesso Imediato", "Comentários em Vídeo"],
    },
];

/// Mock purchase confirmation. No payment is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub user: UserId,
    pub product_id: &'static str,
    pub product_name: &'static str,
    pub amount: Brl,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreService {
    clock: Clock,
}

impl StoreService {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    #[must_use]
    pub fn products(&self) -> &'static [Product] {
        &PRODUCTS
    }

    #[must_use]
    pub fn product(&self, id: &str) -> Option<&'static Product> {
        PRODUCTS.iter().find(|p| p.id == id)
    }

    /// # Errors
    ///
    /// Returns `StoreError::UnknownProduct` if `product_id` is not on sale.
    pub fn checkout(&self, user: UserId, product_id: &str) -> Result<Receipt, StoreError> {
        let product = self
            .product(product_id)
            .ok_or_else(|| StoreError::UnknownProduct(product_id.to_owned()))?;
        info!(%user, product = product.id, "checkout completed");
        Ok(Receipt {
            user,
            product_id: product.id,
            product_name: product.name,
            amount: Brl(product.price_cents),
            purchased_at: self.clock.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::{fixed_clock, fixed_now};

    #[test]
    fn three_plans_are_on_sale() {
        let store = StoreService::new(fixed_clock());
        let names: Vec<_> = store.products().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                "Plano Anual Diamante",
                "Combo Polícia Federal",
                "Pack 500 Questões Comentadas"
            ]
        );
        assert_eq!(Brl(store.products()[0].price_cents).to_string(), "R$ 297.00");
    }

    #[test]
    fn checkout_issues_a_receipt() {
        let store = StoreService::new(fixed_clock());
        let user = UserId::from_u128(1);
        let receipt = store.checkout(user, "p3").unwrap();
        assert_eq!(receipt.amount, Brl(4_700));
        assert_eq!(receipt.purchased_at, fixed_now());
        assert_eq!(
            store.checkout(user, "p9"),
            Err(StoreError::UnknownProduct("p9".into()))
        );
    }
}
