use std::path::{Path, PathBuf};
use std::{fs::File, io::Read};
use tracing::info;
use tracing_test::traced_test;
use upk_package::{error::Error, search::SearchIndex, UnityPackage};
use walkdir::WalkDir;

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources").join(name)
}

fn validate_package(path: &PathBuf) -> Result<(), Error> {
    info!("testing {}", &path.display());

    let parent_dir = &path.with_extension("");
    info!("comparing to files in {}", parent_dir.display());

    let expected_files = WalkDir::new(parent_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .collect::<Vec<_>>();

    let package = UnityPackage::new(path.clone())?;
    assert_eq!(package.file_count(), expected_files.len());

    for record in package.records() {
        let p = parent_dir.join(record.enclosed_path().expect("paths stay inside the package"));
        if record.is_directory() {
            assert!(p.is_dir(), "{} should be a directory", p.display());
            continue;
        }
        info!("comparing to {}", p.display());

        let mut expected = Vec::new();
        let mut f_real = File::open(&p)?;
        f_real.read_to_end(&mut expected)?;

        let mut actual = Vec::new();
        package.open_payload(record)?.read_to_end(&mut actual)?;

        assert_eq!(record.size(), Some(expected.len() as u64));
        assert_eq!(expected.len(), actual.len());
        assert_eq!(expected, actual);
    }

    Ok(())
}

#[traced_test]
#[test]
fn validate_package_parsing() -> Result<(), Error> {
    let to_test = std::fs::read_dir(resource(""))?
        .filter_map(|res| res.ok())
        .map(|dir_entry| dir_entry.path())
        .filter(|e| e.is_file())
        .filter(|path| upk_package::is_unitypackage(path));

    let mut count = 0;
    for path in to_test {
        validate_package(&path)?;
        count += 1;
    }
    assert_eq!(count, 2);
    assert!(logs_contain("indexed 6 assets"));

    Ok(())
}

#[test]
fn dot_root_package_matches_plain_package() -> Result<(), Error> {
    let plain = UnityPackage::new(resource("sample.unitypackage"))?;
    let dotted = UnityPackage::new(resource("dotted.unitypackage"))?;

    let summary = |package: &UnityPackage<PathBuf>| {
        package
            .records()
            .iter()
            .map(|r| (r.path().to_owned(), r.guid().to_owned(), r.size(), r.preview().cloned()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&plain), summary(&dotted));

    let (plain_tree, dotted_tree) = (plain.build_tree()?, dotted.build_tree()?);
    fn displays(index: SearchIndex<'_>) -> Vec<String> {
        index.search("e").iter().map(|e| e.to_string()).collect()
    }
    assert_eq!(
        displays(SearchIndex::new(&plain_tree)),
        displays(SearchIndex::new(&dotted_tree))
    );

    Ok(())
}

#[test]
fn sample_package_contents() -> Result<(), Error> {
    let package = UnityPackage::new(resource("sample.unitypackage"))?;
    assert_eq!(package.len(), 6);
    assert_eq!(package.file_count(), 4);

    let textures = package.by_guid("2a1b3c4d5e6f708192a3b4c5d6e7f809").expect("indexed");
    assert!(textures.is_directory());
    assert_eq!(textures.path(), "Assets/Props/Textures");

    let wood = package.by_path("Assets/Props/Textures/wood.png").expect("indexed");
    let preview = wood.preview().expect("wood.png has a preview");
    assert_eq!((preview.width, preview.height), (4, 4));
    assert_eq!(preview.rgba.len(), 4 * 4 * 4);

    let readme = package.by_path("Assets/readme.txt").expect("indexed");
    assert_eq!(readme.size(), Some(1280));
    assert!(readme.preview().is_none());
    assert!(!readme.has_guid_mismatch());

    Ok(())
}

#[test]
fn sample_package_tree() -> Result<(), Error> {
    let package = UnityPackage::new(resource("sample.unitypackage"))?;
    let tree = package.build_tree()?;

    let assets = tree.child("Assets").expect("Assets exists");
    assert!(assets.is_implied());
    assert_eq!(
        assets.children().map(|c| c.name()).collect::<Vec<_>>(),
        vec!["Props", "Scripts", "readme.txt"]
    );

    let props = assets.child("Props").expect("Props exists");
    assert_eq!(props.to_string(), "Props {1f0c7a8e2b3d4c5e9a6b7c8d9e0f1a2b}");
    assert_eq!(
        props.children().map(|c| c.to_string()).collect::<Vec<_>>(),
        vec![
            "Textures {2a1b3c4d5e6f708192a3b4c5d6e7f809}",
            "Crate.prefab (55 bytes) {4c3d5e6f708192a3b4c5d6e7f8091a2b} 11/14/23",
        ]
    );

    let found = SearchIndex::new(&tree).search("CRATE");
    assert_eq!(
        found.iter().map(|e| e.record().path()).collect::<Vec<_>>(),
        vec!["Assets/Props/Crate.prefab", "Assets/Scripts/CrateSpawner.cs"]
    );

    Ok(())
}
