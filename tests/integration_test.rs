use std::fs;

use tempfile::tempdir;
use ulimi_store::config::CascadePolicy;
use ulimi_store::engine::SessionState;
use ulimi_store::model::{NewUser, OrderStatus, ProductStatus, Role};
use ulimi_store::policy::{Action, Resource};
use ulimi_store::{AppContext, Authenticator, Config, Error};

fn config(dir: &std::path::Path) -> Config {
    Config {
        data_dir: dir.to_path_buf(),
        ..Config::instant()
    }
}

#[test]
fn test_seed_scenario_on_disk() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::open(config(dir.path())).unwrap();
    let domain = ctx.domain();

    domain.delete_farm("farm1").unwrap();

    let crops: Vec<String> = domain.crops().into_iter().map(|c| c.id).collect();
    let products: Vec<String> = domain.products().into_iter().map(|p| p.id).collect();
    assert_eq!(crops, vec!["crop3"]);
    assert_eq!(products, vec!["product2"]);

    // Only the touched collections hit the disk.
    assert!(dir.path().join("ulimi_farms.json").exists());
    assert!(dir.path().join("ulimi_crops.json").exists());
    assert!(dir.path().join("ulimi_products.json").exists());
    assert!(!dir.path().join("ulimi_orders.json").exists());
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let ctx = AppContext::open(config(dir.path())).unwrap();
        ctx.domain().approve_product("product3").unwrap();
        ctx.domain().update_order_status("order1", OrderStatus::Shipped).unwrap();
        ctx.domain().delete_user("customer2").unwrap();
    }

    let ctx = AppContext::open(config(dir.path())).unwrap();
    let domain = ctx.domain();
    assert_eq!(domain.product("product3").unwrap().status, ProductStatus::Approved);
    assert_eq!(domain.order("order1").unwrap().status, OrderStatus::Shipped);
    assert!(domain.user("customer2").is_none());
    assert_eq!(domain.users().len(), 4);
}

#[test]
fn test_malformed_file_falls_back_to_seed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("ulimi_farms.json"), "{{{").unwrap();
    fs::write(dir.path().join("ulimi_orders.json"), "[]").unwrap();

    let ctx = AppContext::open(config(dir.path())).unwrap();
    assert_eq!(ctx.domain().farms().len(), 3);
    assert!(ctx.domain().orders().is_empty());
}

#[test]
fn test_farm_id_only_cascade_from_config() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::open(Config {
        cascade: CascadePolicy::FarmIdOnly,
        ..config(dir.path())
    })
    .unwrap();

    ctx.domain().delete_farm("farm1").unwrap();
    assert!(ctx.domain().product("product3").is_some());
    assert!(ctx.domain().product("product1").is_none());
}

#[tokio::test]
async fn test_session_restored_across_contexts() {
    let dir = tempdir().unwrap();
    {
        let ctx = AppContext::open(config(dir.path())).unwrap();
        ctx.session().login("peter@customer.com", "secret").await.unwrap();
    }

    let ctx = AppContext::open(config(dir.path())).unwrap();
    match ctx.session().state() {
        SessionState::Authenticated(user) => assert_eq!(user.id, "customer1"),
        SessionState::Anonymous => panic!("session was not restored"),
    }

    ctx.session().logout().unwrap();
    assert!(!dir.path().join("ulimi_user.json").exists());
}

#[tokio::test]
async fn test_signed_up_user_is_not_in_login_directory() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::open(config(dir.path())).unwrap();
    ctx.session()
        .signup(NewUser {
            name: "Bwalya Zulu".into(),
            email: "bwalya@customer.com".into(),
            phone: "+260 966 111222".into(),
            role: Role::Customer,
            location: "Kabwe".into(),
            avatar: None,
        })
        .await
        .unwrap();
    ctx.session().logout().unwrap();

    let err = ctx.session().login("bwalya@customer.com", "x").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
}

#[tokio::test]
async fn test_customer_checkout_flow() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::open(config(dir.path())).unwrap();
    let customer = ctx.session().login("grace@customer.com", "x").await.unwrap();

    ctx.authorize(Action::ShopMarketplace, Resource::Any).unwrap();
    ctx.domain().add_to_cart("product1", 10).unwrap();
    ctx.domain().add_to_cart("product2", 4).unwrap();
    assert_eq!(ctx.domain().cart_total(), 152.0);

    let order = ctx.domain().checkout(&customer.id, "Ndola").unwrap();
    assert_eq!(order.total, 152.0);
    assert!(ctx.domain().cart().is_empty());

    ctx.authorize(Action::ManageOrders, Resource::Order(&order)).unwrap();
    ctx.domain().update_order_status(&order.id, OrderStatus::Cancelled).unwrap();
    let err = ctx
        .domain()
        .update_order_status(&order.id, OrderStatus::Confirmed)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));

    let reopened = AppContext::open(config(dir.path())).unwrap();
    assert_eq!(reopened.domain().orders_for_customer("customer2").len(), 1);
}

#[tokio::test]
async fn test_farmer_cannot_touch_other_farms() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::open(config(dir.path())).unwrap();
    ctx.session().login("mary@farmer.com", "x").await.unwrap();

    let farm1 = ctx.domain().farm("farm1").unwrap();
    let err = ctx.authorize(Action::ManageFarms, Resource::Farm(&farm1)).unwrap_err();
    assert!(matches!(err, Error::Forbidden { role: Role::Farmer, .. }));
}

#[test]
fn test_dangling_items_after_product_delete() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::open(config(dir.path())).unwrap();
    assert!(ctx.domain().dangling_order_items().is_empty());

    ctx.domain().delete_product("product1").unwrap();
    let dangling = ctx.domain().dangling_order_items();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].order_id, "order1");
}
