//! GraphQL wire envelopes and the documents the add-product screen sends.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{CategoryId, Company, NewProduct, Product, ProductId},
    error::ServiceError,
};

pub const ADD_PRODUCT_OPERATION: &str = "AddProduct";
pub const ADD_PRODUCT_MUTATION: &str = "mutation AddProduct($product: NewProduct!) { \
createProduct(product: $product) { id name image category { id } brand supplier } }";

pub const GET_ALL_COMPANIES_OPERATION: &str = "GetAllCompanies";
pub const GET_ALL_COMPANIES_QUERY: &str = "query GetAllCompanies { getAllCompanies { id name } }";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest<'a, V> {
    pub query: &'a str,
    pub operation_name: &'a str,
    pub variables: V,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ServiceError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddProductVariables<'a> {
    pub product: &'a NewProduct,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductData {
    pub create_product: CreatedProduct,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllCompaniesData {
    pub get_all_companies: Vec<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
}

/// `createProduct` selection set as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub category: CategoryRef,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl From<CreatedProduct> for Product {
    fn from(value: CreatedProduct) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image_logo: value.image,
            category_id: value.category.id,
            brand: value.brand.unwrap_or_default(),
            supplier: value.supplier.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_product_maps_nested_category_id() {
        let raw = r#"{
            "id": "p-1",
            "name": "Olive oil",
            "image": null,
            "category": { "id": "c-7" },
            "brand": "Gallo",
            "supplier": null
        }"#;
        let created: CreatedProduct = serde_json::from_str(raw).expect("decode");
        let product = Product::from(created);
        assert_eq!(product.id, ProductId::new("p-1"));
        assert_eq!(product.category_id, CategoryId::new("c-7"));
        assert_eq!(product.image_logo, None);
        assert_eq!(product.brand, "Gallo");
        assert_eq!(product.supplier, "");
    }

    #[test]
    fn response_without_data_keeps_error_list() {
        let raw = r#"{ "data": null, "errors": [{ "message": "category not found" }] }"#;
        let response: GraphqlResponse<AddProductData> = serde_json::from_str(raw).expect("decode");
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "category not found");
    }

    #[test]
    fn add_product_request_uses_backend_field_names() {
        let product = NewProduct {
            name: "Rice".into(),
            category_id: "c-1".into(),
            image: None,
            brand: "Tio".into(),
            supplier: "Acme".into(),
        };
        let request = GraphqlRequest {
            query: ADD_PRODUCT_MUTATION,
            operation_name: ADD_PRODUCT_OPERATION,
            variables: AddProductVariables { product: &product },
        };
        let value = serde_json::to_value(&request).expect("encode");
        assert_eq!(value["operationName"], "AddProduct");
        assert_eq!(value["variables"]["product"]["categoryId"], "c-1");
        assert!(value["variables"]["product"].get("image").is_none());
    }
}
