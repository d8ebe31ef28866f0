use serde::Serialize;

/// Reply body of the product endpoints.
///
/// An unknown update target answers `{ "status": ... }` where every other
/// case answers `{ "message": ... }`. The legacy baseline depends on that
/// shape, so it is kept as its own variant rather than silently unified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProductReply {
    Message { message: String },
    Status { status: String },
}

impl ProductReply {
    pub fn message(text: impl Into<String>) -> Self {
        ProductReply::Message {
            message: text.into(),
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        ProductReply::Status {
            status: text.into(),
        }
    }
}

pub trait ProductService: Send + Sync + 'static {
    fn get_products(&self) -> ProductReply;
    fn create_product(&self, input: Option<&str>) -> ProductReply;
    fn update_product(&self, input: Option<&str>) -> ProductReply;
}

/// Fake in-memory product "database". Nothing here is real data.
#[derive(Debug, Clone)]
pub struct LegacyProductService {
    updatable: Vec<String>,
}

impl Default for LegacyProductService {
    fn default() -> Self {
        Self {
            updatable: ["87", "98", "100"].map(String::from).to_vec(),
        }
    }
}

impl ProductService for LegacyProductService {
    fn get_products(&self) -> ProductReply {
        ProductReply::message("Retorna todos produtos")
    }

    fn create_product(&self, input: Option<&str>) -> ProductReply {
        if input == Some("sim") {
            return ProductReply::message("entrou na condicao da criacao do produto");
        }
        ProductReply::message("nao entrou na condicao da criacao do produto")
    }

    fn update_product(&self, input: Option<&str>) -> ProductReply {
        match input {
            Some(id) if self.updatable.iter().any(|known| known == id) => {
                ProductReply::message(format!("o produto {id} foi atualizado"))
            }
            _ => ProductReply::status("nao achou nenhum produto"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_branches_on_sim() {
        let service = LegacyProductService::default();
        assert_eq!(
            service.create_product(Some("sim")),
            ProductReply::message("entrou na condicao da criacao do produto")
        );
        assert_eq!(
            service.create_product(Some("nao")),
            ProductReply::message("nao entrou na condicao da criacao do produto")
        );
        assert_eq!(
            service.create_product(None),
            ProductReply::message("nao entrou na condicao da criacao do produto")
        );
    }

    #[test]
    fn test_update_known_products() {
        let service = LegacyProductService::default();
        for id in ["87", "98", "100"] {
            assert_eq!(
                service.update_product(Some(id)),
                ProductReply::message(format!("o produto {id} foi atualizado"))
            );
        }
    }

    #[test]
    fn test_unknown_update_keeps_status_shape() {
        let reply = LegacyProductService::default().update_product(Some("50"));
        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({ "status": "nao achou nenhum produto" })
        );
    }
}
