#![allow(dead_code)]

use multidelegate_ledger::{DelegationEvent, MultiDelegate, MultiDelegateConfig};
use multidelegate_nullables::{NullAccountStore, NullToken};
use multidelegate_store::GovernanceToken;
use multidelegate_types::{Address, Amount, DelegateId};
use std::sync::{Arc, Mutex};

pub const SYSTEM: Address = Address::new([0x4d; 20]);
pub const TOKEN: Address = Address::new([0xaa; 20]);
pub const OWNER: Address = Address::new([0x0e; 20]);

pub type Engine = MultiDelegate<Arc<NullAccountStore>, Arc<NullToken>>;

pub struct Fixture {
    pub engine: Engine,
    pub token: Arc<NullToken>,
    pub store: Arc<NullAccountStore>,
    pub events: Arc<Mutex<Vec<DelegationEvent>>>,
}

pub fn holder(n: u8) -> Address {
    Address::new([0x10 + n; 20])
}

pub fn delegate(n: u8) -> DelegateId {
    DelegateId::new(Address::new([0x60 + n; 20]))
}

pub fn amt(raw: u128) -> Amount {
    Amount::new(raw)
}

pub fn config() -> MultiDelegateConfig {
    MultiDelegateConfig {
        system_address: SYSTEM,
        owner: OWNER,
        log_level: "warn".into(),
        ..MultiDelegateConfig::default()
    }
}

pub fn setup() -> Fixture {
    config().init_logging();
    let token = Arc::new(NullToken::new(TOKEN));
    let store = Arc::new(NullAccountStore::new());
    let mut engine = MultiDelegate::new(config(), Arc::clone(&store), Arc::clone(&token)).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));
    Fixture {
        engine,
        token,
        store,
        events,
    }
}

/// Give `who` some asset and a max allowance for the ledger.
pub fn fund(token: &NullToken, who: &Address, amount: u128) {
    token.mint(who, amt(amount));
    token.approve(who, &SYSTEM, Amount::MAX).unwrap();
}
