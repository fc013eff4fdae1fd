// Shared fixtures: a mockito server standing in for Magento's XML-RPC endpoint.
#![allow(dead_code)]

use magento_cli::{Magento, MagentoConfig, Result};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};

pub const API_PATH: &str = "/index.php/api/xmlrpc/";
pub const USERNAME: &str = "apiuser";
pub const API_KEY: &str = "apikey123";
pub const TOKEN: &str = "a1b2c3d4e5";

pub fn endpoint(server: &ServerGuard) -> String {
    format!("{}{}", server.url(), API_PATH)
}

pub fn config(server: &ServerGuard) -> MagentoConfig {
    MagentoConfig::new(endpoint(server), USERNAME, API_KEY)
}

/// Wraps a single value in a `methodResponse` document.
pub fn response(value_xml: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <methodResponse><params><param><value>{value_xml}</value></param></params></methodResponse>"
    )
}

pub fn fault(code: i64, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <methodResponse><fault><value><struct>\
         <member><name>faultCode</name><value><int>{code}</int></value></member>\
         <member><name>faultString</name><value><string>{message}</string></value></member>\
         </struct></value></fault></methodResponse>"
    )
}

pub fn login_body() -> String {
    format!(
        "<?xml version=\"1.0\"?><methodCall><methodName>login</methodName><params>\
         <param><value><string>{USERNAME}</string></value></param>\
         <param><value><string>{API_KEY}</string></value></param>\
         </params></methodCall>"
    )
}

/// Expected document for `call(token, procedure, [args...])`; `args_xml` is
/// the concatenated `<value>` elements of the argument list.
pub fn call_body(procedure: &str, args_xml: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodCall><methodName>call</methodName><params>\
         <param><value><string>{TOKEN}</string></value></param>\
         <param><value><string>{procedure}</string></value></param>\
         <param><value><array><data>{args_xml}</data></array></value></param>\
         </params></methodCall>"
    )
}

pub fn mock_login(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", API_PATH)
        .match_header("content-type", "text/xml")
        .match_body(Matcher::Exact(login_body()))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(response(&format!("<string>{TOKEN}</string>")))
        .expect(1)
        .create()
}

/// Mocks one `call` with an exact request body.
pub fn mock_call(server: &mut ServerGuard, procedure: &str, args_xml: &str, reply: &str) -> Mock {
    server
        .mock("POST", API_PATH)
        .match_body(Matcher::Exact(call_body(procedure, args_xml)))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(reply)
        .expect(1)
        .create()
}

/// Catch-all for `call` requests, used to prove none were sent.
pub fn mock_any_call(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", API_PATH)
        .match_body(Matcher::Regex("<methodName>call</methodName>".to_string()))
        .with_status(200)
        .with_body(response("<boolean>1</boolean>"))
        .expect(0)
        .create()
}

pub fn connected(server: &mut ServerGuard) -> (Magento, Mock) {
    let login = mock_login(server);
    let magento = Magento::open(config(server)).expect("login against mock server");
    (magento, login)
}

pub fn string(s: &str) -> String {
    format!("<value><string>{s}</string></value>")
}

pub fn int(i: i64) -> String {
    format!("<value><int>{i}</int></value>")
}

pub type Operation = Box<dyn Fn(&Magento) -> Result<Value>>;

fn boxed(f: impl Fn(&Magento) -> Result<Value> + 'static) -> Operation {
    Box::new(f)
}

/// Every catalog operation paired with its remote procedure and the
/// expected `<value>` elements of its argument list.
pub fn operations() -> Vec<(&'static str, String, Operation)> {
    vec![
        (
            "catalog_product.info",
            string("SKU123"),
            boxed(|m| m.get_product_info("SKU123")),
        ),
        (
            "catalog_product.update",
            format!(
                "{}<value><struct><member><name>price</name>{}</member></struct></value>",
                string("SKU123"),
                string("9.99")
            ),
            boxed(|m| m.update_product_data("SKU123", &json!({"price": "9.99"}))),
        ),
        (
            "catalog_product_attribute_media.list",
            string("SKU123"),
            boxed(|m| m.get_images_of_product("SKU123")),
        ),
        (
            "catalog_product_attribute_media.update",
            format!("{}{}", string("SKU123"), string("/s/h/shoe.jpg")),
            boxed(|m| m.update_image_of_product("SKU123", "/s/h/shoe.jpg", None)),
        ),
        (
            "catalog_product_attribute_media.update",
            format!(
                "{}{}<value><struct><member><name>label</name>{}</member></struct></value>",
                string("SKU124"),
                string("/s/h/shoe.jpg"),
                string("Front")
            ),
            boxed(|m| {
                m.update_image_of_product("SKU124", "/s/h/shoe.jpg", Some(&json!({"label": "Front"})))
            }),
        ),
        (
            "catalog_product_attribute_media.remove",
            format!("{}{}", string("SKU123"), string("/s/h/shoe.jpg")),
            boxed(|m| m.remove_image_of_product("SKU123", "/s/h/shoe.jpg")),
        ),
        (
            "catalog_category.create",
            format!(
                "{}<value><struct><member><name>name</name>{}</member></struct></value>",
                int(3),
                string("Shoes")
            ),
            boxed(|m| m.create_category(3, &json!({"name": "Shoes"}))),
        ),
        (
            "catalog_category.assignProduct",
            format!("{}{}", int(4), string("SKU123")),
            boxed(|m| m.assign_product(4, "SKU123")),
        ),
        (
            "catalog_category.update",
            format!(
                "{}<value><struct><member><name>is_active</name>{}</member></struct></value>",
                int(4),
                int(1)
            ),
            boxed(|m| m.update_category(4, &json!({"is_active": 1}))),
        ),
        (
            "catalog_category.move",
            format!("{}{}", int(4), int(3)),
            boxed(|m| m.move_category(4, 3)),
        ),
        (
            "catalog_category.tree",
            int(5),
            boxed(|m| m.tree_category(5)),
        ),
        (
            "catalog_category.assignedProducts",
            format!("{}{}", int(4), int(1)),
            boxed(|m| m.assigned_products(4, 1)),
        ),
    ]
}
