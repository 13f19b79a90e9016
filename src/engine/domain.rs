use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{CascadePolicy, Config, ReferentialIntegrity};
use crate::engine::{Collection, IdGenerator, Repository};
use crate::model::*;
use crate::{seed, Error, Result};

/// The five persisted collections, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    pub farms: Vec<Farm>,
    pub crops: Vec<Crop>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub users: Vec<User>,
}

impl Collections {
    pub fn farm(&self, id: &str) -> Option<&Farm> {
        self.farms.iter().find(|f| f.id == id)
    }

    pub fn crop(&self, id: &str) -> Option<&Crop> {
        self.crops.iter().find(|c| c.id == id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn farms_for_farmer<'a>(&'a self, farmer_id: &'a str) -> impl Iterator<Item = &'a Farm> + 'a {
        self.farms.iter().filter(move |f| f.farmer_id == farmer_id)
    }

    /// Crops growing on any farm the farmer owns.
    pub fn crops_for_farmer<'a>(&'a self, farmer_id: &'a str) -> impl Iterator<Item = &'a Crop> + 'a {
        let farm_ids: HashSet<&str> = self.farms_for_farmer(farmer_id).map(|f| f.id.as_str()).collect();
        self.crops.iter().filter(move |c| farm_ids.contains(c.farm_id.as_str()))
    }

    pub fn products_for_farmer<'a>(&'a self, farmer_id: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.farmer_id == farmer_id)
    }

    pub fn products_with_status(&self, status: ProductStatus) -> impl Iterator<Item = &Product> + '_ {
        self.products.iter().filter(move |p| p.status == status)
    }

    pub fn orders_for_customer<'a>(&'a self, customer_id: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.iter().filter(move |o| o.customer_id == customer_id)
    }

    /// Orders containing at least one of the farmer's products.
    pub fn orders_for_farmer<'a>(&'a self, farmer_id: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        let product_ids: HashSet<&str> = self.products_for_farmer(farmer_id).map(|p| p.id.as_str()).collect();
        self.orders
            .iter()
            .filter(move |o| o.items.iter().any(|i| product_ids.contains(i.product_id.as_str())))
    }

    /// Order lines whose product no longer exists.
    pub fn dangling_order_items(&self) -> Vec<DanglingItem> {
        let product_ids: HashSet<&str> = self.products.iter().map(|p| p.id.as_str()).collect();
        self.orders
            .iter()
            .flat_map(|o| o.items.iter().map(move |i| (o, i)))
            .filter(|(_, i)| !product_ids.contains(i.product_id.as_str()))
            .map(|(o, i)| DanglingItem {
                order_id: o.id.clone(),
                item_id: i.id.clone(),
                product_id: i.product_id.clone(),
            })
            .collect()
    }

    fn encode(&self, collection: Collection) -> Result<String> {
        let json = match collection {
            Collection::Farms => serde_json::to_string(&self.farms)?,
            Collection::Crops => serde_json::to_string(&self.crops)?,
            Collection::Products => serde_json::to_string(&self.products)?,
            Collection::Orders => serde_json::to_string(&self.orders)?,
            Collection::Users => serde_json::to_string(&self.users)?,
        };
        Ok(json)
    }

    fn changed_since(&self, before: &Collections) -> Vec<Collection> {
        let mut changed = Vec::new();
        if self.farms != before.farms {
            changed.push(Collection::Farms);
        }
        if self.crops != before.crops {
            changed.push(Collection::Crops);
        }
        if self.products != before.products {
            changed.push(Collection::Products);
        }
        if self.orders != before.orders {
            changed.push(Collection::Orders);
        }
        if self.users != before.users {
            changed.push(Collection::Users);
        }
        changed
    }
}

/// An order line pointing at a product that has been deleted.
///
/// Deleting products never touches orders, so these accumulate until someone
/// reconciles them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingItem {
    pub order_id: String,
    pub item_id: String,
    pub product_id: String,
}

/// Removes a farm, its crops and their products. Returns (crops, products) removed.
fn remove_farm(state: &mut Collections, farm_id: &str, cascade: CascadePolicy) -> (usize, usize) {
    state.farms.retain(|f| f.id != farm_id);

    let crop_ids: HashSet<String> = state
        .crops
        .iter()
        .filter(|c| c.farm_id == farm_id)
        .map(|c| c.id.clone())
        .collect();
    state.crops.retain(|c| c.farm_id != farm_id);

    let before = state.products.len();
    state.products.retain(|p| {
        let via_crop = cascade == CascadePolicy::Transitive && crop_ids.contains(&p.crop_id);
        p.farm_id != farm_id && !via_crop
    });

    (crop_ids.len(), before - state.products.len())
}

/// The single source of truth for farms, crops, products, orders, users and the cart.
///
/// Every mutation runs against a copy of the collections. The collections the mutation
/// changed are written in full as one repository commit, and only then does the copy
/// replace the live state. A failed write leaves both memory and the medium as they were.
pub struct DomainStore {
    state: RwLock<Collections>,
    cart: RwLock<Cart>,
    sensors: Vec<IoTSensor>,
    repo: Repository,
    ids: Arc<IdGenerator>,
    integrity: ReferentialIntegrity,
    cascade: CascadePolicy,
}

impl DomainStore {
    /// Restores every collection from `repo`, falling back to demo data for any
    /// collection that is missing or malformed.
    ///
    /// `ids` should be shared with every other store that mints ids in this process.
    pub fn new(repo: Repository, ids: Arc<IdGenerator>, config: &Config) -> Result<Self> {
        let state = Self::restore(&repo, seed::dataset())?;
        info!(
            "Domain store ready: {} farms, {} crops, {} products, {} orders, {} users",
            state.farms.len(),
            state.crops.len(),
            state.products.len(),
            state.orders.len(),
            state.users.len()
        );
        Ok(Self {
            state: RwLock::new(state),
            cart: RwLock::new(Cart::new()),
            sensors: seed::sensors(Utc::now()),
            repo,
            ids,
            integrity: config.integrity,
            cascade: config.cascade,
        })
    }

    fn restore(repo: &Repository, mut base: Collections) -> Result<Collections> {
        if let Some(farms) = repo.load(Collection::Farms)? {
            base.farms = farms;
        }
        if let Some(crops) = repo.load(Collection::Crops)? {
            base.crops = crops;
        }
        if let Some(products) = repo.load(Collection::Products)? {
            base.products = products;
        }
        if let Some(orders) = repo.load(Collection::Orders)? {
            base.orders = orders;
        }
        if let Some(users) = repo.load(Collection::Users)? {
            base.users = users;
        }
        Ok(base)
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Collections) -> Result<T>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.clone();
        let result = operation(&mut next)?;

        self.persist(&next, &next.changed_since(&state))?;

        *state = next;
        Ok(result)
    }

    /// Writes the given collections as one unit: all of them land or none do.
    fn persist(&self, data: &Collections, collections: &[Collection]) -> Result<()> {
        if collections.is_empty() {
            return Ok(());
        }
        let writes = collections
            .iter()
            .map(|&c| -> Result<(&str, Option<String>)> { Ok((c.key(), Some(data.encode(c)?))) })
            .collect::<Result<Vec<_>>>()?;
        self.repo.commit(&writes)
    }

    fn require(&self, exists: bool, entity: &'static str, id: &str) -> Result<()> {
        if exists || self.integrity == ReferentialIntegrity::Lenient {
            Ok(())
        } else {
            Err(Error::InvalidReference { entity, id: id.to_string() })
        }
    }

    fn require_role(&self, state: &Collections, id: &str, role: Role) -> Result<()> {
        let exists = state.user(id).map_or(false, |u| u.role == role);
        self.require(exists, role.as_str(), id)
    }

    // Farms

    pub fn add_farm(&self, data: NewFarm) -> Result<Farm> {
        self.mutate(|state| {
            self.require_role(state, &data.farmer_id, Role::Farmer)?;
            let farm = data.into_farm(self.ids.next("farm"), Utc::now());
            state.farms.push(farm.clone());
            Ok(farm)
        })
    }

    /// Merges `patch` into the farm. Unknown ids are ignored.
    pub fn update_farm(&self, id: &str, patch: FarmPatch) -> Result<()> {
        self.mutate(|state| {
            if let Some(farmer_id) = &patch.farmer_id {
                self.require_role(state, farmer_id, Role::Farmer)?;
            }
            match state.farms.iter_mut().find(|f| f.id == id) {
                Some(farm) => patch.apply(farm),
                None => debug!("update_farm: no farm {}", id),
            }
            Ok(())
        })
    }

    /// Deletes the farm along with its crops and products.
    pub fn delete_farm(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            let existed = state.farm(id).is_some();
            let (crops, products) = remove_farm(state, id, self.cascade);
            if existed {
                info!("Deleted farm {} ({} crops, {} products)", id, crops, products);
            } else {
                debug!("delete_farm: no farm {}", id);
            }
            Ok(())
        })
    }

    // Crops

    pub fn add_crop(&self, data: NewCrop) -> Result<Crop> {
        self.mutate(|state| {
            self.require(state.farm(&data.farm_id).is_some(), "farm", &data.farm_id)?;
            let crop = data.into_crop(self.ids.next("crop"));
            state.crops.push(crop.clone());
            Ok(crop)
        })
    }

    /// Merges `patch` into the crop. A status change must move the crop forward.
    pub fn update_crop(&self, id: &str, patch: CropPatch) -> Result<()> {
        self.mutate(|state| {
            if let Some(farm_id) = &patch.farm_id {
                self.require(state.farm(farm_id).is_some(), "farm", farm_id)?;
            }
            match state.crops.iter_mut().find(|c| c.id == id) {
                Some(crop) => patch.apply(crop)?,
                None => debug!("update_crop: no crop {}", id),
            }
            Ok(())
        })
    }

    /// Deletes the crop and every product made from it.
    pub fn delete_crop(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            let existed = state.crop(id).is_some();
            state.crops.retain(|c| c.id != id);
            let before = state.products.len();
            state.products.retain(|p| p.crop_id != id);
            if existed {
                info!("Deleted crop {} ({} products)", id, before - state.products.len());
            } else {
                debug!("delete_crop: no crop {}", id);
            }
            Ok(())
        })
    }

    /// Appends a cost line to a crop. Returns `None` if the crop does not exist.
    pub fn add_crop_input(&self, crop_id: &str, data: NewCropInput) -> Result<Option<CropInput>> {
        self.mutate(|state| {
            let Some(crop) = state.crops.iter_mut().find(|c| c.id == crop_id) else {
                debug!("add_crop_input: no crop {}", crop_id);
                return Ok(None);
            };
            let input = data.into_input(self.ids.next("input"));
            crop.inputs.push(input.clone());
            Ok(Some(input))
        })
    }

    // Products

    /// Lists new produce. Listings always start pending review.
    pub fn add_product(&self, data: NewProduct) -> Result<Product> {
        self.mutate(|state| {
            self.require_role(state, &data.farmer_id, Role::Farmer)?;
            self.require(state.farm(&data.farm_id).is_some(), "farm", &data.farm_id)?;
            self.require(state.crop(&data.crop_id).is_some(), "crop", &data.crop_id)?;
            let product = data.into_product(self.ids.next("product"), Utc::now());
            state.products.push(product.clone());
            Ok(product)
        })
    }

    pub fn update_product(&self, id: &str, patch: ProductPatch) -> Result<()> {
        self.mutate(|state| {
            if let Some(farm_id) = &patch.farm_id {
                self.require(state.farm(farm_id).is_some(), "farm", farm_id)?;
            }
            if let Some(crop_id) = &patch.crop_id {
                self.require(state.crop(crop_id).is_some(), "crop", crop_id)?;
            }
            match state.products.iter_mut().find(|p| p.id == id) {
                Some(product) => patch.apply(product),
                None => debug!("update_product: no product {}", id),
            }
            Ok(())
        })
    }

    /// Moves a listing along its review lifecycle.
    pub fn set_product_status(&self, id: &str, status: ProductStatus) -> Result<()> {
        self.mutate(|state| {
            match state.products.iter_mut().find(|p| p.id == id) {
                Some(product) => product.status = product.status.transition(status)?,
                None => debug!("set_product_status: no product {}", id),
            }
            Ok(())
        })
    }

    pub fn approve_product(&self, id: &str) -> Result<()> {
        self.set_product_status(id, ProductStatus::Approved)
    }

    pub fn reject_product(&self, id: &str) -> Result<()> {
        self.set_product_status(id, ProductStatus::Rejected)
    }

    /// Deletes the listing. Orders that reference it keep their lines.
    pub fn delete_product(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            state.products.retain(|p| p.id != id);
            Ok(())
        })
    }

    // Orders

    /// Places an order. Orders always start pending.
    pub fn add_order(&self, data: NewOrder) -> Result<Order> {
        self.mutate(|state| {
            self.require_role(state, &data.customer_id, Role::Customer)?;
            for item in &data.items {
                self.require(state.product(&item.product_id).is_some(), "product", &item.product_id)?;
            }
            let order = Order {
                id: self.ids.next("order"),
                customer_id: data.customer_id,
                items: data
                    .items
                    .into_iter()
                    .map(|item| item.into_item(self.ids.next("item")))
                    .collect(),
                total: data.total,
                status: OrderStatus::Pending,
                shipping_address: data.shipping_address,
                created_at: Utc::now(),
            };
            state.orders.push(order.clone());
            Ok(order)
        })
    }

    pub fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<()> {
        self.mutate(|state| {
            match state.orders.iter_mut().find(|o| o.id == id) {
                Some(order) => order.status = order.status.transition(status)?,
                None => debug!("update_order_status: no order {}", id),
            }
            Ok(())
        })
    }

    // Cart

    pub fn add_to_cart(&self, product_id: &str, quantity: u32) -> Result<()> {
        let exists = self.read().product(product_id).is_some();
        self.require(exists, "product", product_id)?;
        self.cart.write().unwrap_or_else(PoisonError::into_inner).add(product_id, quantity)
    }

    pub fn remove_from_cart(&self, product_id: &str) {
        self.cart.write().unwrap_or_else(PoisonError::into_inner).remove(product_id);
    }

    pub fn clear_cart(&self) {
        self.cart.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn cart(&self) -> Vec<CartEntry> {
        self.cart.read().unwrap_or_else(PoisonError::into_inner).entries().to_vec()
    }

    /// Value of the cart at current prices. Entries for deleted products count as zero.
    pub fn cart_total(&self) -> f64 {
        let entries = self.cart();
        let state = self.read();
        entries
            .iter()
            .filter_map(|e| state.product(&e.product_id).map(|p| f64::from(e.quantity) * p.price_per_unit))
            .sum()
    }

    /// Turns the cart into a pending order at current prices, then empties the cart.
    ///
    /// Every product in the cart must still exist and be approved for sale.
    pub fn checkout(&self, customer_id: &str, shipping_address: &str) -> Result<Order> {
        let entries = self.cart();
        if entries.is_empty() {
            return Err(Error::InvalidInput("cart is empty".to_string()));
        }

        let items = {
            let state = self.read();
            entries
                .iter()
                .map(|e| -> Result<NewOrderItem> {
                    let product = state.product(&e.product_id).ok_or_else(|| Error::InvalidReference {
                        entity: "product",
                        id: e.product_id.clone(),
                    })?;
                    if product.status != ProductStatus::Approved {
                        return Err(Error::InvalidInput(format!(
                            "product {} is {} and cannot be ordered",
                            product.id, product.status
                        )));
                    }
                    Ok(NewOrderItem::priced(&product.id, e.quantity, product.price_per_unit))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let order = self.add_order(NewOrder::from_items(customer_id, items, shipping_address))?;
        self.clear_cart();
        info!("Checked out order {} for {} ({} items)", order.id, customer_id, order.items.len());
        Ok(order)
    }

    // Users

    pub fn add_user(&self, data: NewUser) -> Result<User> {
        self.mutate(|state| {
            let user = data.into_user(self.ids.next("user"), Utc::now());
            state.users.push(user.clone());
            Ok(user)
        })
    }

    pub fn update_user(&self, id: &str, patch: UserPatch) -> Result<()> {
        self.mutate(|state| {
            match state.users.iter_mut().find(|u| u.id == id) {
                Some(user) => patch.apply(user),
                None => debug!("update_user: no user {}", id),
            }
            Ok(())
        })
    }

    /// Deletes the user, every farm they own (with the farm cascade) and every order
    /// they placed. Orders placed by others for this user's products are kept.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            state.users.retain(|u| u.id != id);

            let farm_ids: Vec<String> = state.farms_for_farmer(id).map(|f| f.id.clone()).collect();
            for farm_id in &farm_ids {
                remove_farm(state, farm_id, self.cascade);
            }

            let before = state.orders.len();
            state.orders.retain(|o| o.customer_id != id);
            info!(
                "Deleted user {} ({} farms, {} orders)",
                id,
                farm_ids.len(),
                before - state.orders.len()
            );
            Ok(())
        })
    }

    // Persistence

    /// Writes every collection, changed or not.
    pub fn save_data(&self) -> Result<()> {
        let state = self.read();
        self.persist(&state, &Collection::ALL)
    }

    /// Replaces each collection that has a readable persisted value; others are kept.
    pub fn load_data(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let restored = Self::restore(&self.repo, state.clone())?;
        *state = restored;
        Ok(())
    }

    /// Forgets every persisted collection and returns to the demo data. The session
    /// entry is untouched.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.repo.clear_collections()?;
        *state = seed::dataset();
        self.clear_cart();
        info!("Reset domain store to demo data");
        Ok(())
    }

    // Readers

    pub fn snapshot(&self) -> Collections {
        self.read().clone()
    }

    pub fn farms(&self) -> Vec<Farm> {
        self.read().farms.clone()
    }

    pub fn crops(&self) -> Vec<Crop> {
        self.read().crops.clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.read().products.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.read().orders.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.read().users.clone()
    }

    pub fn sensors(&self) -> &[IoTSensor] {
        &self.sensors
    }

    pub fn farm(&self, id: &str) -> Option<Farm> {
        self.read().farm(id).cloned()
    }

    pub fn crop(&self, id: &str) -> Option<Crop> {
        self.read().crop(id).cloned()
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.read().product(id).cloned()
    }

    pub fn order(&self, id: &str) -> Option<Order> {
        self.read().order(id).cloned()
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.read().user(id).cloned()
    }

    pub fn farms_for_farmer(&self, farmer_id: &str) -> Vec<Farm> {
        self.read().farms_for_farmer(farmer_id).cloned().collect()
    }

    pub fn crops_for_farmer(&self, farmer_id: &str) -> Vec<Crop> {
        self.read().crops_for_farmer(farmer_id).cloned().collect()
    }

    pub fn products_for_farmer(&self, farmer_id: &str) -> Vec<Product> {
        self.read().products_for_farmer(farmer_id).cloned().collect()
    }

    /// Listings customers can buy.
    pub fn approved_products(&self) -> Vec<Product> {
        self.read().products_with_status(ProductStatus::Approved).cloned().collect()
    }

    /// Listings waiting for admin review.
    pub fn pending_products(&self) -> Vec<Product> {
        self.read().products_with_status(ProductStatus::Pending).cloned().collect()
    }

    pub fn orders_for_customer(&self, customer_id: &str) -> Vec<Order> {
        self.read().orders_for_customer(customer_id).cloned().collect()
    }

    pub fn orders_for_farmer(&self, farmer_id: &str) -> Vec<Order> {
        self.read().orders_for_farmer(farmer_id).cloned().collect()
    }

    pub fn sensors_for_farm(&self, farm_id: &str) -> Vec<IoTSensor> {
        self.sensors.iter().filter(|s| s.farm_id == farm_id).cloned().collect()
    }

    pub fn dangling_order_items(&self) -> Vec<DanglingItem> {
        self.read().dangling_order_items()
    }
}
