//! Who may do what.
//!
//! Every front end asks [`Policy::check`] before calling into the stores, so the role
//! and ownership rules live in one place.

use std::fmt;

use crate::model::{Farm, Order, Product, Role, User};
use crate::{Error, Result};

const FARMERS: &[Role] = &[Role::Farmer];
const CUSTOMERS: &[Role] = &[Role::Customer];
const ADMINS: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Any signed-in user.
    ViewDashboard,
    ViewMarketplace,
    ViewWeather,
    ViewNews,
    ViewForum,
    // Farmers.
    ManageFarms,
    ManageCrops,
    ViewSensors,
    ViewSoil,
    UseAssistant,
    ListProduce,
    // Customers.
    ShopMarketplace,
    ManageOrders,
    // Admins.
    ManageUsers,
    ReviewProducts,
    CompareFarms,
    ViewAnalytics,
}

impl Action {
    /// Roles allowed to attempt the action. `None` means every role.
    pub fn roles(self) -> Option<&'static [Role]> {
        use Action::*;
        match self {
            ViewDashboard | ViewMarketplace | ViewWeather | ViewNews | ViewForum => None,
            ManageFarms | ManageCrops | ViewSensors | ViewSoil | UseAssistant | ListProduce => Some(FARMERS),
            ShopMarketplace | ManageOrders => Some(CUSTOMERS),
            ManageUsers | ReviewProducts | CompareFarms | ViewAnalytics => Some(ADMINS),
        }
    }

    fn as_str(self) -> &'static str {
        use Action::*;
        match self {
            ViewDashboard => "view the dashboard",
            ViewMarketplace => "view the marketplace",
            ViewWeather => "view weather",
            ViewNews => "view news",
            ViewForum => "view the forum",
            ManageFarms => "manage farms",
            ManageCrops => "manage crops",
            ViewSensors => "view sensors",
            ViewSoil => "view soil data",
            UseAssistant => "use the farming assistant",
            ListProduce => "list produce",
            ShopMarketplace => "shop the marketplace",
            ManageOrders => "manage orders",
            ManageUsers => "manage users",
            ReviewProducts => "review products",
            CompareFarms => "compare farms",
            ViewAnalytics => "view analytics",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record an action targets, for ownership checks.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Any,
    Farm(&'a Farm),
    Product(&'a Product),
    Order(&'a Order),
    User(&'a User),
}

impl Resource<'_> {
    /// Whether `user` owns the resource. Users own themselves.
    fn owned_by(&self, user: &User) -> bool {
        match self {
            Resource::Any => true,
            Resource::Farm(farm) => farm.farmer_id == user.id,
            Resource::Product(product) => product.farmer_id == user.id,
            Resource::Order(order) => order.customer_id == user.id,
            Resource::User(other) => other.id == user.id,
        }
    }
}

pub struct Policy;

impl Policy {
    /// Checks that `user` may perform `action` on `resource`.
    ///
    /// Farmers and customers may only act on what they own. Admins pass the ownership
    /// check for the admin actions.
    pub fn check(user: Option<&User>, action: Action, resource: Resource<'_>) -> Result<()> {
        let user = user.ok_or(Error::NotAuthenticated)?;
        let forbidden = || Error::Forbidden { role: user.role, action };

        if let Some(roles) = action.roles() {
            if !roles.contains(&user.role) {
                return Err(forbidden());
            }
        }

        if user.role == Role::Admin || resource.owned_by(user) {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    pub fn allows(user: Option<&User>, action: Action, resource: Resource<'_>) -> bool {
        Self::check(user, action, resource).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn user(id: &str) -> User {
        seed::users().into_iter().find(|u| u.id == id).unwrap()
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let err = Policy::check(None, Action::ViewDashboard, Resource::Any).unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }

    #[test]
    fn test_shared_views_open_to_every_role() {
        for id in ["admin1", "farmer1", "customer1"] {
            let u = user(id);
            assert!(Policy::allows(Some(&u), Action::ViewMarketplace, Resource::Any));
            assert!(Policy::allows(Some(&u), Action::ViewWeather, Resource::Any));
        }
    }

    #[test]
    fn test_role_gates() {
        let farmer = user("farmer1");
        let customer = user("customer1");
        let admin = user("admin1");

        assert!(Policy::allows(Some(&farmer), Action::ViewSensors, Resource::Any));
        assert!(!Policy::allows(Some(&customer), Action::ViewSensors, Resource::Any));
        assert!(Policy::allows(Some(&customer), Action::ShopMarketplace, Resource::Any));
        assert!(!Policy::allows(Some(&farmer), Action::ShopMarketplace, Resource::Any));
        assert!(Policy::allows(Some(&admin), Action::ViewAnalytics, Resource::Any));

        let err = Policy::check(Some(&farmer), Action::ManageUsers, Resource::Any).unwrap_err();
        assert!(matches!(err, Error::Forbidden { role: Role::Farmer, action: Action::ManageUsers }));
    }

    #[test]
    fn test_farmers_own_their_farms_and_products() {
        let data = seed::dataset();
        let joseph = user("farmer1");
        let mary = user("farmer2");
        let farm1 = data.farm("farm1").unwrap();
        let product2 = data.product("product2").unwrap();

        assert!(Policy::allows(Some(&joseph), Action::ManageFarms, Resource::Farm(farm1)));
        assert!(!Policy::allows(Some(&mary), Action::ManageFarms, Resource::Farm(farm1)));
        assert!(Policy::allows(Some(&mary), Action::ListProduce, Resource::Product(product2)));
        assert!(!Policy::allows(Some(&joseph), Action::ListProduce, Resource::Product(product2)));
    }

    #[test]
    fn test_customers_own_their_orders() {
        let data = seed::dataset();
        let order = data.order("order1").unwrap();

        assert!(Policy::allows(Some(&user("customer1")), Action::ManageOrders, Resource::Order(order)));
        assert!(!Policy::allows(Some(&user("customer2")), Action::ManageOrders, Resource::Order(order)));
    }

    #[test]
    fn test_admins_act_on_any_resource() {
        let data = seed::dataset();
        let admin = user("admin1");
        let farmer = user("farmer1");

        assert!(Policy::allows(Some(&admin), Action::ManageUsers, Resource::User(&farmer)));
        assert!(Policy::allows(Some(&admin), Action::ReviewProducts, Resource::Product(data.product("product3").unwrap())));
        assert!(!Policy::allows(Some(&admin), Action::ManageFarms, Resource::Farm(data.farm("farm1").unwrap())));
    }
}
