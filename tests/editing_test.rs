use gradle_splice::{
    ApplyError, ApplyOptions, Dependency, DependencySelector, EditorError, EditorOptions, Modification,
    ModificationKind, Serializer, SourceRange, StructuredEditor, UpdateTarget, apply_modifications, parse,
};

const GROOVY: &str = include_str!("fixtures/build.gradle");
const KOTLIN: &str = include_str!("fixtures/build.gradle.kts");

fn mysql() -> DependencySelector {
    DependencySelector::new("mysql", "mysql-connector-java")
}

fn apply(editor: &StructuredEditor) -> String {
    Serializer::new(editor.index().original_text())
        .apply(editor.modifications())
        .unwrap()
}

/// Pairs of (original, edited) lines that differ
fn changed_lines<'a>(before: &'a str, after: &'a str) -> Vec<(&'a str, &'a str)> {
    assert_eq!(before.lines().count(), after.lines().count(), "line count changed");
    before.lines().zip(after.lines()).filter(|(a, b)| a != b).collect()
}

#[test]
fn test_identity_for_empty_modification_set() {
    for text in [GROOVY, KOTLIN, "", "\n\n", "no entities here {\n}"] {
        assert_eq!(apply_modifications(text, &[], ApplyOptions::default()).unwrap(), text);
    }
}

#[test]
fn test_ranges_round_trip_for_every_entity() {
    for text in [GROOVY, KOTLIN] {
        let index = parse(text);

        let ranges = index
            .dependencies
            .iter()
            .map(|e| (e.range, e.raw_text.as_str()))
            .chain(index.plugins.iter().map(|e| (e.range, e.raw_text.as_str())))
            .chain(index.repositories.iter().map(|e| (e.range, e.raw_text.as_str())))
            .chain(index.properties.iter().map(|e| (e.range, e.raw_text.as_str())));

        for (range, raw) in ranges {
            assert_eq!(&text[range.byte_start()..range.byte_end()], raw);
        }
        assert!(index.warnings().is_empty());
    }
}

#[test]
fn test_fixture_entities_recognized() {
    let index = parse(GROOVY);

    assert_eq!(index.plugins.len(), 3);
    assert_eq!(index.dependencies.len(), 4);
    assert_eq!(index.repositories.len(), 2);
    // group, version, springCloudVersion
    assert_eq!(index.properties.len(), 3);

    // The commented-out dependency is not an entity
    assert!(index.dependencies.iter().all(|d| d.value.group != "org.example"));

    let lombok = &index.dependencies[2];
    assert_eq!(lombok.value.configuration, "compileOnly");
    assert_eq!(lombok.value.version.as_deref(), Some("1.18.24"));
    assert_eq!(lombok.line(), 23);
}

#[test]
fn test_single_update_changes_one_line() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();

    assert_eq!(editor.modifications().len(), 1);
    assert_eq!(editor.modifications()[0].kind, ModificationKind::Replace);

    let output = apply(&editor);
    assert_eq!(
        changed_lines(GROOVY, &output),
        vec![(
            "    implementation 'mysql:mysql-connector-java:8.0.29'",
            "    implementation 'mysql:mysql-connector-java:8.0.30'"
        )]
    );
}

#[test]
fn test_repeated_update_adds_nothing() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();
    let once = editor.snapshot();

    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();
    editor
        .update_value(&UpdateTarget::Dependency(mysql()), "8.0.30")
        .unwrap();

    assert_eq!(editor.snapshot(), once);
}

#[test]
fn test_insert_lands_before_closing_brace() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor
        .insert_dependency(&Dependency::new(
            "implementation",
            "com.google.guava",
            "guava",
            Some("31.1-jre"),
        ))
        .unwrap();

    let output = apply(&editor);
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[24], "    implementation 'com.google.guava:guava:31.1-jre'");
    assert_eq!(lines[23], "    testImplementation 'org.springframework.boot:spring-boot-starter-test'");
    assert_eq!(lines[25], "}");

    // Everything else is untouched
    let mut without: Vec<&str> = lines.clone();
    without.remove(24);
    assert_eq!(without, GROOVY.lines().collect::<Vec<_>>());
}

#[test]
fn test_three_disjoint_updates_change_three_lines() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();
    editor
        .update_plugin_version("org.springframework.boot", "2.7.5")
        .unwrap();
    editor.update_property("springCloudVersion", "2021.0.5").unwrap();

    let output = apply(&editor);
    assert_eq!(
        changed_lines(GROOVY, &output),
        vec![
            (
                "    id 'org.springframework.boot' version '2.7.0'",
                "    id 'org.springframework.boot' version '2.7.5'"
            ),
            ("    springCloudVersion = '2021.0.3'", "    springCloudVersion = '2021.0.5'"),
            (
                "    implementation 'mysql:mysql-connector-java:8.0.29'",
                "    implementation 'mysql:mysql-connector-java:8.0.30'"
            ),
        ]
    );

    let diff = Serializer::new(GROOVY).diff(editor.modifications());
    assert_eq!(diff.len(), 6);
}

#[test]
fn test_order_independence() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();
    editor.update_property("version", "0.0.2").unwrap();
    editor
        .remove_dependency(&DependencySelector::new("org.projectlombok", "lombok"))
        .unwrap();
    editor
        .insert_repository(&gradle_splice::Repository::new("maven", Some("https://repo.example.com")))
        .unwrap();

    let mods = editor.snapshot();
    let expected = apply_modifications(GROOVY, &mods, ApplyOptions::default()).unwrap();

    let permutations: [[usize; 4]; 6] = [
        [3, 2, 1, 0],
        [1, 0, 3, 2],
        [2, 3, 0, 1],
        [0, 2, 1, 3],
        [3, 0, 2, 1],
        [1, 3, 0, 2],
    ];
    for order in permutations {
        let permuted: Vec<Modification> = order.iter().map(|&i| mods[i].clone()).collect();
        assert_eq!(
            apply_modifications(GROOVY, &permuted, ApplyOptions::default()).unwrap(),
            expected,
            "order {:?}",
            order
        );
    }

    assert!(expected.contains("version = '0.0.2'"));
    assert!(!expected.contains("lombok"));
    assert!(expected.contains("    maven { url 'https://repo.example.com' }\n}"));
}

#[test]
fn test_missing_dependency_is_not_found() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();

    let err = editor
        .update_dependency_version(&DependencySelector::new("com.nowhere", "ghost"), "1.0")
        .unwrap_err();

    assert_eq!(
        err,
        EditorError::NotFound {
            kind: "dependency",
            selector: "com.nowhere:ghost".to_string()
        }
    );
    assert_eq!(editor.modifications().len(), 1);
}

#[test]
fn test_corrupted_old_text_is_a_mismatch() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();

    let mut mods = editor.snapshot();
    mods[0].old_text = "implementation 'mysql:mysql-connector-java:9.9.9'".to_string();

    let err = apply_modifications(GROOVY, &mods, ApplyOptions::default()).unwrap_err();
    match err {
        ApplyError::TextMismatch { expected, actual } => {
            assert_eq!(expected, "implementation 'mysql:mysql-connector-java:9.9.9'");
            assert_eq!(actual, "implementation 'mysql:mysql-connector-java:8.0.29'");
        }
        other => panic!("Expected TextMismatch, got {:?}", other),
    }
}

#[test]
fn test_drifted_modification_recovers_on_its_line() {
    let offset = GROOVY.find("    implementation 'mysql").unwrap();
    let drifted = Modification::replace(
        SourceRange::from_bytes(GROOVY, offset, offset + 6),
        "8.0.29",
        "8.0.30",
        "bump mysql",
    );

    let recovered = apply_modifications(GROOVY, &[drifted.clone()], ApplyOptions::default()).unwrap();
    assert_eq!(
        changed_lines(GROOVY, &recovered),
        vec![(
            "    implementation 'mysql:mysql-connector-java:8.0.29'",
            "    implementation 'mysql:mysql-connector-java:8.0.30'"
        )]
    );

    let strict = ApplyOptions {
        local_recovery: false,
    };
    assert!(matches!(
        apply_modifications(GROOVY, &[drifted], strict),
        Err(ApplyError::TextMismatch { .. })
    ));
}

#[test]
fn test_kotlin_session() {
    let options = EditorOptions {
        dialect: gradle_splice::Dialect::Kotlin,
        ..EditorOptions::default()
    };
    let mut editor = StructuredEditor::from_text(KOTLIN, options);

    editor
        .update_plugin_version("org.jetbrains.kotlin.jvm", "1.9.21")
        .unwrap();
    editor
        .update_dependency_version(&DependencySelector::new("io.ktor", "ktor-server-core"), "2.3.6")
        .unwrap();
    editor
        .insert_plugin(&gradle_splice::Plugin::new("application", None))
        .unwrap();

    let output = apply(&editor);
    assert!(output.contains("    kotlin(\"jvm\") version \"1.9.21\"\n"));
    assert!(output.contains("    implementation(\"io.ktor:ktor-server-core:2.3.6\")\n"));
    assert!(output.contains("    id(\"org.jetbrains.dokka\") version \"1.9.10\"\n    id(\"application\")\n}\n"));
}

#[test]
fn test_validate_reports_overlaps_before_apply() {
    let mut editor = StructuredEditor::from_text(GROOVY, EditorOptions::default());
    editor.update_dependency_version(&mysql(), "8.0.30").unwrap();

    let mut mods = editor.snapshot();
    let range = mods[0].range;
    mods.push(Modification::delete(range, mods[0].old_text.clone(), "conflicting delete"));

    let serializer = Serializer::new(GROOVY);
    assert_eq!(serializer.validate(&mods).len(), 1);
    assert!(serializer.apply_checked(&mods).is_err());
    assert!(serializer.apply_checked(&mods[..1]).is_ok());
}
