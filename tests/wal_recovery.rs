//! WAL recovery scenarios with literal ledger values.

use persistence::{GameDb, TxKind, WalEntry};

#[test]
fn trade_row_replays_exactly_once() {
    // Ledger: trade, 5 -> 7, 1000 gold, unprocessed. Balances 3000/500
    // become 2000/1500 after one recovery and stay there after a second.
    let mut db = GameDb::open_memory().unwrap();
    let seller = db.characters().create("a", "seller", 3000).unwrap();
    let buyer = db.characters().create("b", "buyer", 500).unwrap();

    db.wal()
        .write(&[WalEntry::gold(TxKind::Trade, seller, buyer, 1000)])
        .unwrap();

    assert_eq!(db.wal().recover().unwrap(), 1);
    assert_eq!(db.characters().load(seller).unwrap().adena, 2000);
    assert_eq!(db.characters().load(buyer).unwrap().adena, 1500);
    assert_eq!(db.wal().unprocessed_count().unwrap(), 0);

    assert_eq!(db.wal().recover().unwrap(), 0);
    assert_eq!(db.characters().load(seller).unwrap().adena, 2000);
    assert_eq!(db.characters().load(buyer).unwrap().adena, 1500);
}

#[test]
fn fanned_out_transaction_replays_every_row() {
    // One logical trade is two rows: gold one way, an item the other.
    let mut db = GameDb::open_memory().unwrap();
    let a = db.characters().create("acct", "A", 5000).unwrap();
    let b = db.characters().create("acct", "B", 0).unwrap();
    let sword = db.items().insert(b, 1, 1, 6, 100, false).unwrap();

    db.wal()
        .write(&[
            WalEntry::gold(TxKind::Trade, a, b, 2500),
            WalEntry::item(TxKind::Trade, b, a, sword, 1, 6),
        ])
        .unwrap();

    assert_eq!(db.wal().recover().unwrap(), 2);
    assert_eq!(db.characters().load(a).unwrap().adena, 2500);
    assert_eq!(db.characters().load(b).unwrap().adena, 2500);
    let a_items = db.items().load_for_char(a).unwrap();
    assert_eq!(a_items.len(), 1);
    assert_eq!(a_items[0].enchant_lvl, 6);
    assert!(db.items().load_for_char(b).unwrap().is_empty());
}

#[test]
fn item_row_already_applied_is_skipped() {
    // The transfer was applied before the crash (rows reparent
    // immediately); recovery's owner guard must not double-move or error.
    let mut db = GameDb::open_memory().unwrap();
    let a = db.characters().create("acct", "A", 0).unwrap();
    let b = db.characters().create("acct", "B", 0).unwrap();
    let item = db.items().insert(a, 1, 1, 0, 100, false).unwrap();

    db.wal()
        .write(&[WalEntry::item(TxKind::Trade, a, b, item, 1, 0)])
        .unwrap();
    // Simulate the pre-crash application.
    assert!(db.items().reparent(item, a, b).unwrap());

    assert_eq!(db.wal().recover().unwrap(), 1);
    assert_eq!(db.items().load_for_char(b).unwrap().len(), 1);
    assert!(db.items().load_for_char(a).unwrap().is_empty());
}

#[test]
fn mark_processed_retires_backlog_without_replaying() {
    let mut db = GameDb::open_memory().unwrap();
    let a = db.characters().create("acct", "A", 100).unwrap();
    let b = db.characters().create("acct", "B", 0).unwrap();

    db.wal()
        .write(&[WalEntry::gold(TxKind::Shop, a, b, 40)])
        .unwrap();
    assert_eq!(db.wal().mark_processed().unwrap(), 1);

    // The batch path saved balances itself; recovery must not re-apply.
    assert_eq!(db.wal().recover().unwrap(), 0);
    assert_eq!(db.characters().load(a).unwrap().adena, 100);
}

#[test]
fn missing_character_row_is_skipped_and_consumed() {
    let mut db = GameDb::open_memory().unwrap();
    let real = db.characters().create("acct", "Real", 700).unwrap();

    db.wal()
        .write(&[
            WalEntry::gold(TxKind::Auction, 999_999, real, 100),
            WalEntry::gold(TxKind::Auction, real, 999_999, 100),
        ])
        .unwrap();

    // Both rows reference a missing character: skipped, logged, consumed.
    assert_eq!(db.wal().recover().unwrap(), 0);
    assert_eq!(db.characters().load(real).unwrap().adena, 700);
    assert_eq!(db.wal().unprocessed_count().unwrap(), 0);
}

#[test]
fn rows_replay_in_ledger_order() {
    // Two sequential transfers through an intermediary only balance if
    // replayed in ledger-id order.
    let mut db = GameDb::open_memory().unwrap();
    let a = db.characters().create("acct", "A", 1000).unwrap();
    let b = db.characters().create("acct", "B", 0).unwrap();
    let c = db.characters().create("acct", "C", 0).unwrap();

    db.wal()
        .write(&[
            WalEntry::gold(TxKind::Trade, a, b, 1000),
            WalEntry::gold(TxKind::Trade, b, c, 600),
        ])
        .unwrap();

    assert_eq!(db.wal().recover().unwrap(), 2);
    assert_eq!(db.characters().load(a).unwrap().adena, 0);
    assert_eq!(db.characters().load(b).unwrap().adena, 400);
    assert_eq!(db.characters().load(c).unwrap().adena, 600);
}
