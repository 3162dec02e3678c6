use crate::content::Block;
use crate::model::TSModel;
use crate::pages::{Page, Registry};

use color_eyre::eyre::{eyre, Report, Result};
use tsqc_trees::examples::example_1;
use tsqc_trees::{TableCollection, TreeSequence, NODE_IS_SAMPLE, NULL};

fn model() -> TSModel {
    TSModel::new(example_1(), "example_1.trees")
}

/// One sample, no edges, sites or mutations.
fn minimal_model() -> Result<TSModel, Report> {
    let mut tables = TableCollection::new(100.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    Ok(TSModel::new(TreeSequence::new(tables)?, "minimal.trees"))
}

#[test]
fn page_order() {
    let names: Vec<String> = Page::all().iter().map(|p| p.to_string()).collect();
    assert_eq!(names, ["Overview", "Mutations", "Edges", "Edge Explorer", "Trees", "Nodes", "Popgen"]);
    assert_eq!(Registry::new().pages(), Page::all());
}

#[test]
fn every_page_renders() -> Result<(), Report> {
    let model = model();
    let registry = Registry::new();
    for page in registry.pages() {
        let renderer = registry.get(page)?;
        let content = renderer(&model)?;
        assert!(!content.is_empty(), "{page}");
        assert!(matches!(content.blocks[0], Block::Heading(_)), "{page}");
    }
    Ok(())
}

#[test]
fn every_page_but_popgen_renders_minimal() -> Result<(), Report> {
    let model = minimal_model()?;
    let registry = Registry::new();
    for page in registry.pages().into_iter().filter(|p| *p != Page::Popgen) {
        let content = registry.get(page)?(&model)?;
        assert!(!content.is_empty(), "{page}");
    }

    let error = registry.get(Page::Popgen)?(&model).unwrap_err();
    assert!(error.to_string().contains("at least two samples"));
    Ok(())
}

#[test]
fn overview_summary() -> Result<(), Report> {
    let content = crate::pages::overview::render(&model())?;
    let tables = content.tables();
    assert_eq!(tables[0].get_column("Value")?[0], "example_1.trees");
    // one population holding every node and all four samples
    assert_eq!(tables[1].rows, [["0", "pop_0", "7", "4"]]);
    assert_eq!(tables[2].rows, [["0", "2024-01-01 00:00:00", "tsqc"]]);
    Ok(())
}

#[test]
fn mutations_table() -> Result<(), Report> {
    let content = crate::pages::mutations::render(&model())?;
    let table = content.tables()[0];
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.get_column("inherited samples")?, ["2", "1", "3", "1", "1"]);
    assert_eq!(table.get_column("derived state")?, ["T", "G", "A", "C", "T"]);
    assert_eq!(content.figures().count(), 3);
    Ok(())
}

#[test]
fn mutations_empty() -> Result<(), Report> {
    let content = crate::pages::mutations::render(&minimal_model()?)?;
    assert!(content.figures().next().is_none());
    assert!(content.to_html().contains("no mutations"));
    Ok(())
}

#[test]
fn edges_longest_first() -> Result<(), Report> {
    let content = crate::pages::edges::render(&model())?;
    let tables = content.tables();
    assert_eq!(tables[0].rows[0], ["Edges", "8"]);
    let spans = tables[1].get_column("span")?;
    assert_eq!(spans, ["10", "10", "10", "10", "5", "5", "5", "5"]);
    Ok(())
}

#[test]
fn edge_explorer_parents() -> Result<(), Report> {
    let content = crate::pages::edge_explorer::render(&model())?;
    let parents = content.tables()[0].get_column("parent")?;
    // nodes 5 and 6 have three child edges each, node 4 two
    assert_eq!(parents, ["5", "5", "5", "6", "6", "6", "4", "4"]);
    assert_eq!(content.figures().count(), 3);
    Ok(())
}

#[test]
fn trees_table() -> Result<(), Report> {
    let content = crate::pages::trees::render(&model())?;
    let table = content.tables()[0];
    assert_eq!(table.get_column("left")?, ["0", "5"]);
    assert_eq!(table.get_column("mutations")?, ["2", "3"]);
    assert_eq!(table.get_column("total branch length")?, ["9", "9"]);
    Ok(())
}

#[test]
fn nodes_by_population() -> Result<(), Report> {
    let content = crate::pages::nodes::render(&model())?;
    let tables = content.tables();
    assert_eq!(tables[0].rows[2], ["Non-samples", "3"]);
    assert_eq!(tables[1].rows, [["0", "7", "4"]]);
    assert_eq!(tables[2].get_column("id")?, ["4", "5", "6"]);
    Ok(())
}

#[test]
fn popgen_statistics() -> Result<(), Report> {
    let content = crate::pages::popgen::render(&model())?;
    let tables = content.tables();
    assert_eq!(tables[0].get_column("Value")?, ["0.2167", "0.4", "-0.065"]);
    assert_eq!(tables[1].rows.len(), 10);
    Ok(())
}

#[test]
fn registry_override() -> Result<(), Report> {
    let registry = Registry::new().with(Page::Mutations, |_| Err(eyre!("bad site")));
    assert_eq!(registry.pages().len(), 7);
    let error = registry.get(Page::Mutations)?(&model()).unwrap_err();
    assert_eq!(error.to_string(), "bad site");
    Ok(())
}

#[test]
fn registry_unregistered() {
    let registry = Registry::empty().with(Page::Overview, crate::pages::overview::render);
    assert_eq!(registry.pages(), [Page::Overview]);
    assert!(registry.lookup("Trees").is_err());
    assert!(registry.lookup("trees").is_err());
    assert_eq!(registry.parse("Trees"), None);
    assert_eq!(registry.parse("Overview"), Some(Page::Overview));
}
