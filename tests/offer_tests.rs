/// Offer library tests: on-disk store, board moves, CSV exchange and the
/// activity log, driven through the public library API.
use offerdash::activity::{ActivityKind, ActivityLog, AuditedStore};
use offerdash::analytics::utc;
use offerdash::error::OfferError;
use offerdash::offers::board::{self, Board, Moved};
use offerdash::offers::csv_io;
use offerdash::offers::store::{JsonFileStore, MemoryStore, OfferFilter, OfferStore};
use offerdash::offers::{NewOffer, OfferLinks, OfferPatch, ScaleStatus};
use tempfile::TempDir;

fn new_offer(name: &str, platform: &str, cost: f64, revenue: f64) -> NewOffer {
    NewOffer {
        name: name.to_string(),
        platform: Some(platform.to_string()),
        niche: Some("Emagrecimento".to_string()),
        cost: Some(cost),
        revenue: Some(revenue),
        ..NewOffer::default()
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

#[test]
fn json_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let created = {
        let store = JsonFileStore::in_dir(dir.path());
        store.insert(new_offer("Funil Keto", "Google Ads", 100.0, 300.0)).unwrap()
    };

    let reopened = JsonFileStore::in_dir(dir.path());
    let loaded = reopened.get(&created.id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.profit(), 200.0);
    assert_eq!(loaded.roi(), 200.0);
}

#[test]
fn json_store_starts_empty_without_file() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    assert!(store.all().unwrap().is_empty());
}

#[test]
fn json_store_update_and_delete() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let offer = store.insert(new_offer("Curso Inglês", "TikTok Ads", 10.0, 5.0)).unwrap();

    let patch = OfferPatch {
        revenue: Some(50.0),
        niche: Some(String::new()),
        ..OfferPatch::default()
    };
    let updated = store.update(&offer.id, patch).unwrap();
    assert_eq!(updated.revenue, Some(50.0));
    assert_eq!(updated.niche, None);
    assert_eq!(updated.created_at, offer.created_at);

    store.delete(&offer.id).unwrap();
    assert!(matches!(store.get(&offer.id), Err(OfferError::NotFound(_))));
    assert!(matches!(store.delete(&offer.id), Err(OfferError::NotFound(_))));
}

#[test]
fn store_rejects_invalid_offers() {
    let store = MemoryStore::new();
    let short = store.insert(new_offer("X", "Google Ads", 0.0, 0.0));
    assert!(matches!(short, Err(OfferError::Validation(_))));

    let bad_link = NewOffer {
        links: OfferLinks {
            checkout_link: Some("ftp://example.com".to_string()),
            ..OfferLinks::default()
        },
        ..new_offer("Oferta", "Google Ads", 0.0, 0.0)
    };
    assert!(matches!(store.insert(bad_link), Err(OfferError::Validation(_))));

    let negative = new_offer("Oferta", "Google Ads", -1.0, 0.0);
    assert!(matches!(store.insert(negative), Err(OfferError::Validation(_))));
    assert!(store.all().unwrap().is_empty());
}

#[test]
fn filter_combines_fields() {
    let store = MemoryStore::new();
    store.insert(new_offer("Keto Max", "Google Ads", 0.0, 0.0)).unwrap();
    store.insert(new_offer("Keto Slim", "Facebook Ads", 0.0, 0.0)).unwrap();
    store.insert(new_offer("Inglês Já", "Google Ads", 0.0, 0.0)).unwrap();

    let filter = OfferFilter {
        platform: Some("Google Ads".to_string()),
        search: Some("keto".to_string()),
        ..OfferFilter::default()
    };
    let names: Vec<_> = store
        .list(&filter)
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    assert_eq!(names, vec!["Keto Max"]);
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[test]
fn board_groups_by_status_with_column_profit() {
    let store = MemoryStore::new();
    let a = store.insert(new_offer("Oferta A", "Google Ads", 10.0, 40.0)).unwrap();
    store.insert(new_offer("Oferta B", "Google Ads", 10.0, 15.0)).unwrap();
    board::move_offer(&store, &a.id, ScaleStatus::Escalando).unwrap();

    let board = Board::from_offers(store.all().unwrap());
    let titles: Vec<_> = board.columns.iter().map(|c| c.title).collect();
    assert_eq!(
        titles,
        vec!["🚀 Inicio", "📈 Pré escala", "🔥 Escalando", "💸 ESCALADISSIMA"]
    );

    let inicio = board.column(ScaleStatus::Inicio).unwrap();
    assert_eq!(inicio.offers.len(), 1);
    assert_eq!(inicio.total_profit, 5.0);
    let escalando = board.column(ScaleStatus::Escalando).unwrap();
    assert_eq!(escalando.offers[0].id, a.id);
    assert_eq!(escalando.total_profit, 30.0);
}

#[test]
fn moving_to_the_same_column_is_a_no_op() {
    let store = MemoryStore::new();
    let offer = store.insert(new_offer("Oferta", "Google Ads", 0.0, 0.0)).unwrap();
    let moved = board::move_offer(&store, &offer.id, ScaleStatus::Inicio).unwrap();
    assert_eq!(moved, Moved::Unchanged(offer));
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn csv_export_then_import_restores_offers() {
    let source = MemoryStore::new();
    source
        .insert(NewOffer {
            scale_status: Some(ScaleStatus::PreEscala),
            links: OfferLinks {
                sales_page_link: Some("https://vendas.example.com".to_string()),
                upsell_links: vec![
                    "https://up1.example.com".to_string(),
                    "https://up2.example.com".to_string(),
                ],
                ..OfferLinks::default()
            },
            ..new_offer("Oferta, com vírgula", "Google Ads", 12.5, 40.0)
        })
        .unwrap();
    source.insert(new_offer("Segunda", "Facebook Ads", 0.0, 0.0)).unwrap();

    let csv = csv_io::export_to_string(&source.all().unwrap(), &utc()).unwrap();
    assert!(csv.starts_with('\u{feff}'));

    let target = MemoryStore::new();
    let report = csv_io::import_offers(&target, csv.as_bytes()).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 0);

    let imported = target
        .list(&OfferFilter {
            search: Some("vírgula".to_string()),
            ..OfferFilter::default()
        })
        .unwrap();
    assert_eq!(imported.len(), 1);
    let offer = &imported[0];
    assert_eq!(offer.scale_status, ScaleStatus::PreEscala);
    assert_eq!(offer.cost, Some(12.5));
    assert_eq!(offer.links.upsell_links.len(), 2);
}

#[test]
fn csv_import_skips_rows_without_required_values() {
    let csv = "Nome da Oferta,Plataforma,Custo,Receita\n\
               Boa,Google Ads,\"10,50\",20\n\
               ,Google Ads,1,1\n\
               Sem plataforma,,1,1\n";
    let store = MemoryStore::new();
    let report = csv_io::import_offers(&store, csv.as_bytes()).unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(store.all().unwrap()[0].cost, Some(10.5));
}

#[test]
fn csv_import_rejects_empty_input() {
    let store = MemoryStore::new();
    assert!(csv_io::import_offers(&store, "".as_bytes()).is_err());
    assert!(csv_io::import_offers(&store, "Nome da Oferta,Plataforma\n".as_bytes()).is_err());
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[test]
fn audited_store_records_each_mutation() {
    let dir = TempDir::new().unwrap();
    let log = ActivityLog::in_dir(dir.path());
    let store = AuditedStore::new(JsonFileStore::in_dir(dir.path()), log.clone());

    let offer = store.insert(new_offer("Oferta", "Google Ads", 1.0, 2.0)).unwrap();
    board::move_offer(&store, &offer.id, ScaleStatus::Escalando).unwrap();
    store
        .update(
            &offer.id,
            OfferPatch {
                revenue: Some(9.0),
                ..OfferPatch::default()
            },
        )
        .unwrap();
    store.delete(&offer.id).unwrap();

    let kinds: Vec<_> = log.read_all().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActivityKind::Created,
            ActivityKind::Moved,
            ActivityKind::Updated,
            ActivityKind::Deleted
        ]
    );
    let recent = log.read_recent(1);
    assert_eq!(recent[0].kind, ActivityKind::Deleted);
}

#[test]
fn failed_mutations_are_not_logged() {
    let dir = TempDir::new().unwrap();
    let log = ActivityLog::in_dir(dir.path());
    let store = AuditedStore::new(MemoryStore::new(), log.clone());
    assert!(store.delete("missing").is_err());
    assert!(log.read_all().is_empty());
}
