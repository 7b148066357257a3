use crate::error::{Error, Result};
use crate::structs::{parse_struct, split_structs};
use ini::Ini;
use m3_mod_core::{Game, GAME1_EMBEDDED_TLK_FOLDER};
use std::collections::{BTreeMap, HashMap};

const BASEGAME: &str = "BASEGAME";
const BALANCE_CHANGES: &str = "BALANCE_CHANGES";

const ME1_HEADERS: &[&str] = &[BASEGAME, "BRING_DOWN_THE_SKY", "PINNACLE_STATION"];

const ME2_HEADERS: &[&str] = &[
    BASEGAME,
    "AEGIS_PACK",
    "APPEARANCE_PACK_1",
    "APPEARANCE_PACK_2",
    "ARC_PROJECTOR",
    "ARRIVAL",
    "BLOOD_DRAGON_ARMOR",
    "CERBERUS_WEAPON_ARMOR",
    "COLLECTORS_WEAPON_ARMOR",
    "EQUALIZER_PACK",
    "FIREPOWER_PACK",
    "FIREWALKER",
    "GENESIS",
    "INCISOR",
    "INFERNO_ARMOR",
    "KASUMI",
    "LAIR_OF_THE_SHADOW_BROKER",
    "NORMANDY_CRASH_SITE",
    "OVERLORD",
    "RECON_HOOD",
    "SENTRY_INTERFACE",
    "TERMINUS_WEAPON_ARMOR",
    "UMBRA_VISOR",
    "ZAEED",
];

const ME3_HEADERS: &[&str] = &[
    BASEGAME,
    "RESURGENCE",
    "REBELLION",
    "EARTH",
    "RETALIATION",
    "RECKONING",
    "PATCH1",
    "PATCH2",
    "FROM_ASHES",
    "EXTENDED_CUT",
    "LEVIATHAN",
    "OMEGA",
    "CITADEL",
    "CITADEL_BASE",
    "APPEARANCE",
    "FIREFIGHT",
    "GROUNDSIDE",
    "GENESIS2",
    "COLLECTORS_EDITION",
    "TESTPATCH",
    BALANCE_CHANGES,
];

/// Legendary Edition titles ship every official DLC, so only `BASEGAME` applies.
const LE_HEADERS: &[&str] = &[BASEGAME];

/// Official job headers `game` accepts, `BASEGAME` first.
pub fn official_headers(game: Game) -> &'static [&'static str] {
    match game {
        Game::ME1 => ME1_HEADERS,
        Game::ME2 => ME2_HEADERS,
        Game::ME3 => ME3_HEADERS,
        Game::LE1 | Game::LE2 | Game::LE3 => LE_HEADERS,
    }
}

/// Parsed contents of a `moddesc.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModManifest {
    pub name: String,
    pub version: String,
    pub game: Game,
    /// `[ModManager] cmmver`, defaults to `1.0`.
    pub cmmver: f64,
    /// `[BASEGAME]` and official DLC jobs, in header order.
    pub jobs: Vec<InstallJob>,
    /// Folders inside the mod that hold custom DLC content.
    pub custom_dlc_source_dirs: Vec<String>,
    /// Names the custom DLC folders are installed as. Falls back to the source names.
    pub custom_dlc_dest_dirs: Vec<String>,
    pub custom_dlc_alternates: Alternates,
    pub additional_deployment_folders: Vec<String>,
    pub additional_deployment_files: Vec<String>,
    /// `[GAME1_EMBEDDED_TLK] usesfeature`.
    pub uses_embedded_tlk: bool,
    /// `[ModInfo] bannerimagename`, a file inside `M3Images`.
    pub banner_image: Option<String>,
}

/// An installation job under an official header such as `[BASEGAME]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallJob {
    pub header: String,
    /// `moddir`, relative to the mod root. `.` is the root itself.
    pub directory: String,
    /// Every `newfiles` item is a folder installed with its whole tree.
    pub game_directory_structure: bool,
    /// `newfiles`, relative to [`InstallJob::directory`].
    pub new_files: Vec<String>,
    /// `addfiles`, relative to [`InstallJob::directory`].
    pub add_files: Vec<String>,
    pub alternates: Alternates,
}

/// Optional install choices of one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alternates {
    /// `altfiles`
    pub files: Vec<Alternate>,
    /// `altdlc`, only read under `[CUSTOMDLC]`.
    pub dlc: Vec<Alternate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alternate {
    pub friendly_name: Option<String>,
    /// `None` for alternates that only remove or skip content.
    pub source: Option<AlternateSource>,
}

/// Mod-relative content an alternate installs.
#[derive(Debug, Clone, PartialEq)]
pub enum AlternateSource {
    /// `AltFile` for alternate files, the `ModAltDLC` folder for alternate DLC.
    Path(String),
    /// Files of a `multilistN` key, relative to `root`.
    MultiList { root: String, files: Vec<String> },
}

impl ModManifest {
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let get = |section: &str, key: &str| value(ini, section, key);

        let name = get("ModInfo", "modname").ok_or(Error::MissingModName)?;
        let version = get("ModInfo", "modver").unwrap_or_else(|| "1.0".to_string());

        let game = match get("ModInfo", "game") {
            Some(game) => game
                .parse::<Game>()
                .map_err(|_| Error::InvalidGame(game.clone()))?,
            None => Game::ME3,
        };

        let cmmver = match get("ModManager", "cmmver") {
            Some(raw) => raw
                .parse::<f64>()
                .map(|v| (v * 10.0).round() / 10.0)
                .map_err(|_| Error::InvalidCmmVer(raw.clone()))?,
            None => 1.0,
        };

        let mut jobs = Vec::new();
        for header in official_headers(game) {
            if *header == BALANCE_CHANGES && cmmver < 4.3 {
                continue;
            }
            if let Some(job) = parse_job(ini, header, game, cmmver)? {
                jobs.push(job);
            }
        }

        let custom_dlc_source_dirs = split_list(get("CUSTOMDLC", "sourcedirs"));
        let mut custom_dlc_dest_dirs = split_list(get("CUSTOMDLC", "destdirs"));
        if custom_dlc_dest_dirs.is_empty() {
            custom_dlc_dest_dirs = custom_dlc_source_dirs.clone();
        }
        let custom_dlc_alternates = parse_alternates(ini, "CUSTOMDLC", cmmver, true)?;

        let uses_embedded_tlk = get(GAME1_EMBEDDED_TLK_FOLDER, "usesfeature")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self {
            name,
            version,
            game,
            cmmver,
            jobs,
            custom_dlc_source_dirs,
            custom_dlc_dest_dirs,
            custom_dlc_alternates,
            additional_deployment_folders: split_list(get("UPDATES", "additionaldeploymentfolders")),
            additional_deployment_files: split_list(get("UPDATES", "additionaldeploymentfiles")),
            uses_embedded_tlk,
            banner_image: get("ModInfo", "bannerimagename").map(|v| normalize(&v)),
        })
    }
}

fn value(ini: &Ini, section: &str, key: &str) -> Option<String> {
    ini.section(Some(section))
        .and_then(|props| props.get(key))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_job(ini: &Ini, header: &str, game: Game, cmmver: f64) -> Result<Option<InstallJob>> {
    let get = |key: &str| value(ini, header, key);
    let Some(directory) = get("moddir") else {
        return Ok(None);
    };

    let new_files = paired_list(header, "newfiles", get("newfiles"), get("replacefiles"))?;
    let add_files = if cmmver >= 4.1 && (game == Game::ME3 || header == BASEGAME) {
        paired_list(header, "addfiles", get("addfiles"), get("addfilestargets"))?
    } else {
        None
    };
    if new_files.is_none() && add_files.is_none() {
        return Err(Error::EmptyJob(header.to_string()));
    }

    let game_directory_structure = cmmver >= 6.0
        && get("gamedirectorystructure").is_some_and(|v| v.eq_ignore_ascii_case("true"));
    let alternates = if header == BALANCE_CHANGES {
        Alternates::default()
    } else {
        parse_alternates(ini, header, cmmver, false)?
    };

    let job = InstallJob {
        header: header.to_string(),
        directory: normalize(&directory),
        game_directory_structure,
        new_files: new_files.unwrap_or_default(),
        add_files: add_files.unwrap_or_default(),
        alternates,
    };
    tracing::debug!(
        "Parsed job header={} moddir={} newfiles={} addfiles={}",
        job.header,
        job.directory,
        job.new_files.len(),
        job.add_files.len()
    );
    Ok(Some(job))
}

/// Source list of a source/target key pair. `None` unless both keys are set.
fn paired_list(
    header: &str,
    list: &str,
    sources: Option<String>,
    targets: Option<String>,
) -> Result<Option<Vec<String>>> {
    let (Some(sources), Some(targets)) = (sources, targets) else {
        return Ok(None);
    };
    let sources = split_list(Some(sources));
    let targets = split_list(Some(targets));
    if sources.len() != targets.len() {
        return Err(Error::MismatchedJobLists {
            header: header.to_string(),
            list: list.to_string(),
            sources: sources.len(),
            targets: targets.len(),
        });
    }
    Ok(Some(sources))
}

fn parse_alternates(ini: &Ini, header: &str, cmmver: f64, with_dlc: bool) -> Result<Alternates> {
    let multilists = if cmmver >= 6.0 {
        parse_multilists(ini, header)
    } else {
        BTreeMap::new()
    };

    let mut alternates = Alternates::default();
    if cmmver >= 4.2 {
        if let Some(raw) = value(ini, header, "altfiles") {
            alternates.files =
                parse_alternate_list(&raw, header, &multilists, &["altfile", "substitutefile"])?;
        }
    }
    if with_dlc && cmmver >= 4.4 {
        if let Some(raw) = value(ini, header, "altdlc") {
            alternates.dlc = parse_alternate_list(&raw, header, &multilists, &["modaltdlc"])?;
        }
    }
    Ok(alternates)
}

/// `multilist1`, `multilist2`, ... until the first missing key.
fn parse_multilists(ini: &Ini, header: &str) -> BTreeMap<u32, Vec<String>> {
    let mut multilists = BTreeMap::new();
    for id in 1.. {
        match value(ini, header, &format!("multilist{id}")) {
            Some(list) => {
                multilists.insert(id, split_list(Some(list)));
            }
            None => break,
        }
    }
    multilists
}

fn parse_alternate_list(
    raw: &str,
    header: &str,
    multilists: &BTreeMap<u32, Vec<String>>,
    path_keys: &[&str],
) -> Result<Vec<Alternate>> {
    split_structs(raw)?
        .into_iter()
        .map(|item| {
            let props = parse_struct(item)?;
            Ok(Alternate {
                friendly_name: props.get("friendlyname").cloned(),
                source: alternate_source(&props, item, header, multilists, path_keys)?,
            })
        })
        .collect()
}

fn alternate_source(
    props: &HashMap<String, String>,
    item: &str,
    header: &str,
    multilists: &BTreeMap<u32, Vec<String>>,
    path_keys: &[&str],
) -> Result<Option<AlternateSource>> {
    let path = path_keys
        .iter()
        .find_map(|key| props.get(*key).filter(|v| !v.is_empty()));
    if let Some(path) = path {
        return Ok(Some(AlternateSource::Path(normalize(path))));
    }

    let Some(id) = props.get("multilistid") else {
        return Ok(None);
    };
    let id: u32 = id.parse().map_err(|_| Error::InvalidStruct {
        value: item.to_string(),
        reason: format!("MultiListId '{id}' is not a number"),
    })?;
    let files = multilists.get(&id).ok_or_else(|| Error::UnknownMultiList {
        header: header.to_string(),
        id,
    })?;
    let root = props
        .get("multilistrootpath")
        .map(|r| normalize(r))
        .unwrap_or_default();

    Ok(Some(AlternateSource::MultiList {
        root,
        files: files.iter().map(|f| normalize(f)).collect(),
    }))
}

/// Backslash separators, no leading separator.
fn normalize(path: &str) -> String {
    path.trim().replace('/', "\\").trim_start_matches('\\').to_string()
}

/// Split a `;` separated moddesc list, dropping empty items.
fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(';')
                .map(normalize)
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ModManifest> {
        let ini = Ini::load_from_str_noescape(text).unwrap();
        ModManifest::from_ini(&ini)
    }

    #[test]
    fn test_defaults() {
        let manifest = parse("[ModInfo]\nmodname = Minimal\n").unwrap();
        assert_eq!(manifest.game, Game::ME3);
        assert_eq!(manifest.cmmver, 1.0);
        assert_eq!(manifest.version, "1.0");
        assert!(!manifest.uses_embedded_tlk);
        assert!(manifest.custom_dlc_source_dirs.is_empty());
        assert!(manifest.jobs.is_empty());
        assert_eq!(manifest.banner_image, None);
    }

    #[test]
    fn test_lists_and_case_insensitive_keys() {
        let manifest = parse(
            "[modmanager]\nCMMVER = 7.0\n[MODINFO]\nGame = me2\nModName = Lists\n\
             [customdlc]\nsourcedirs = DLC_A; DLC_B ;\ndestdirs = DLC_MOD_A;DLC_MOD_B\n\
             [updates]\nadditionaldeploymentfolders = Extras/Docs\n",
        )
        .unwrap();

        assert_eq!(manifest.game, Game::ME2);
        assert_eq!(manifest.cmmver, 7.0);
        assert_eq!(manifest.custom_dlc_source_dirs, vec!["DLC_A", "DLC_B"]);
        assert_eq!(manifest.custom_dlc_dest_dirs, vec!["DLC_MOD_A", "DLC_MOD_B"]);
        assert_eq!(manifest.additional_deployment_folders, vec!["Extras\\Docs"]);
    }

    #[test]
    fn test_missing_modname() {
        assert!(matches!(
            parse("[ModInfo]\ngame = ME1\n"),
            Err(Error::MissingModName)
        ));
    }

    #[test]
    fn test_invalid_game_and_cmmver() {
        assert!(matches!(
            parse("[ModInfo]\nmodname = X\ngame = ME4\n"),
            Err(Error::InvalidGame(_))
        ));
        assert!(matches!(
            parse("[ModManager]\ncmmver = eight\n[ModInfo]\nmodname = X\n"),
            Err(Error::InvalidCmmVer(_))
        ));
    }

    #[test]
    fn test_basegame_and_official_dlc_jobs() {
        let manifest = parse(
            "[ModManager]\ncmmver = 6.0\n[ModInfo]\nmodname = Jobs\ngame = ME3\n\
             [BASEGAME]\nmoddir = BASEGAME\nnewfiles = SFXGame.pcc;Startup.pcc\n\
             replacefiles = BIOGame\\CookedPCConsole\\SFXGame.pcc;BIOGame\\CookedPCConsole\\Startup.pcc\n\
             addfiles = New.pcc\naddfilestargets = BIOGame\\CookedPCConsole\\New.pcc\n\
             [CITADEL]\nmoddir = Citadel/Files\nnewfiles = BioD_Cit.pcc\n\
             replacefiles = /BIOGame/DLC/DLC_EXP_Pack003/CookedPCConsole/BioD_Cit.pcc\n\
             [ARRIVAL]\nmoddir = Ignored\nnewfiles = a.pcc\nreplacefiles = b.pcc\n",
        )
        .unwrap();

        let headers: Vec<&str> = manifest.jobs.iter().map(|j| j.header.as_str()).collect();
        assert_eq!(headers, vec!["BASEGAME", "CITADEL"]);

        let basegame = &manifest.jobs[0];
        assert_eq!(basegame.directory, "BASEGAME");
        assert_eq!(basegame.new_files, vec!["SFXGame.pcc", "Startup.pcc"]);
        assert_eq!(basegame.add_files, vec!["New.pcc"]);
        assert!(!basegame.game_directory_structure);

        assert_eq!(manifest.jobs[1].directory, "Citadel\\Files");
    }

    #[test]
    fn test_legendary_edition_reads_only_basegame() {
        let manifest = parse(
            "[ModManager]\ncmmver = 7.0\n[ModInfo]\nmodname = LE\ngame = LE3\n\
             [BASEGAME]\nmoddir = .\nnewfiles = a.pcc\nreplacefiles = BIOGame\\a.pcc\n\
             [CITADEL]\nmoddir = Citadel\nnewfiles = b.pcc\nreplacefiles = b.pcc\n",
        )
        .unwrap();

        assert_eq!(manifest.jobs.len(), 1);
        assert_eq!(manifest.jobs[0].directory, ".");
    }

    #[test]
    fn test_job_list_errors() {
        assert!(matches!(
            parse(
                "[ModInfo]\nmodname = X\n[BASEGAME]\nmoddir = B\nnewfiles = a.pcc;b.pcc\nreplacefiles = a.pcc\n"
            ),
            Err(Error::MismatchedJobLists { sources: 2, targets: 1, .. })
        ));
        assert!(matches!(
            parse("[ModInfo]\nmodname = X\n[BASEGAME]\nmoddir = B\n"),
            Err(Error::EmptyJob(header)) if header == "BASEGAME"
        ));
    }

    #[test]
    fn test_game_directory_structure_needs_moddesc_6() {
        let text = |cmmver: &str| {
            format!(
                "[ModManager]\ncmmver = {cmmver}\n[ModInfo]\nmodname = G\n\
                 [BASEGAME]\nmoddir = Base\nnewfiles = BIOGame\nreplacefiles = BIOGame\n\
                 gamedirectorystructure = true\n"
            )
        };
        assert!(parse(&text("6.0")).unwrap().jobs[0].game_directory_structure);
        assert!(!parse(&text("5.1")).unwrap().jobs[0].game_directory_structure);
    }

    #[test]
    fn test_alternate_files_with_multilists() {
        let manifest = parse(
            "[ModManager]\ncmmver = 6.1\n[ModInfo]\nmodname = Alts\ngame = ME3\n\
             [BASEGAME]\nmoddir = Base\nnewfiles = a.pcc\nreplacefiles = a.pcc\n\
             multilist1 = one.pcc;sub/two.pcc\n\
             altfiles = ((Condition=COND_MANUAL, FriendlyName=\"Blue, please\", ModOperation=OP_SUBSTITUTE, ModFile=a.pcc, AltFile=Alt/a_blue.pcc), \
             (Condition=COND_MANUAL, ModOperation=OP_APPLY_MULTILISTFILES, MultiListId=1, MultiListRootPath=Alt\\Lists), \
             (Condition=COND_MANUAL, ModOperation=OP_NOINSTALL, ModFile=a.pcc))\n",
        )
        .unwrap();

        let files = &manifest.jobs[0].alternates.files;
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].friendly_name.as_deref(), Some("Blue, please"));
        assert_eq!(
            files[0].source,
            Some(AlternateSource::Path("Alt\\a_blue.pcc".to_string()))
        );
        assert_eq!(
            files[1].source,
            Some(AlternateSource::MultiList {
                root: "Alt\\Lists".to_string(),
                files: vec!["one.pcc".to_string(), "sub\\two.pcc".to_string()],
            })
        );
        assert_eq!(files[2].source, None);
    }

    #[test]
    fn test_alternate_files_ignored_before_moddesc_4_2() {
        let manifest = parse(
            "[ModManager]\ncmmver = 4.1\n[ModInfo]\nmodname = Old\n\
             [BASEGAME]\nmoddir = Base\nnewfiles = a.pcc\nreplacefiles = a.pcc\n\
             altfiles = ((Condition=COND_MANUAL, ModFile=a.pcc, AltFile=Alt\\a.pcc))\n",
        )
        .unwrap();
        assert!(manifest.jobs[0].alternates.files.is_empty());
    }

    #[test]
    fn test_custom_dlc_alternate_dlc() {
        let manifest = parse(
            "[ModManager]\ncmmver = 6.0\n[ModInfo]\nmodname = AltDlc\n\
             [CUSTOMDLC]\nsourcedirs = DLC_MOD_Main\ndestdirs = DLC_MOD_Main\n\
             multilist1 = x.pcc\n\
             altdlc = ((Condition=COND_DLC_PRESENT, ConditionalDLC=DLC_MOD_Other, ModOperation=OP_ADD_CUSTOMDLC, ModAltDLC=Compat/DLC_MOD_Patch, ModDestDLC=DLC_MOD_Patch), \
             (Condition=COND_MANUAL, ModOperation=OP_ADD_MULTILISTFILES_TO_CUSTOMDLC, MultiListId=1, MultiListRootPath=Extra, ModDestDLC=DLC_MOD_Main/CookedPCConsole))\n",
        )
        .unwrap();

        let dlc = &manifest.custom_dlc_alternates.dlc;
        assert_eq!(
            dlc[0].source,
            Some(AlternateSource::Path("Compat\\DLC_MOD_Patch".to_string()))
        );
        assert_eq!(
            dlc[1].source,
            Some(AlternateSource::MultiList {
                root: "Extra".to_string(),
                files: vec!["x.pcc".to_string()],
            })
        );
    }

    #[test]
    fn test_unknown_multilist() {
        let result = parse(
            "[ModManager]\ncmmver = 6.0\n[ModInfo]\nmodname = Bad\n\
             [CUSTOMDLC]\nsourcedirs = DLC_MOD_Main\n\
             altdlc = ((Condition=COND_MANUAL, ModOperation=OP_ADD_MULTILISTFILES_TO_CUSTOMDLC, MultiListId=4, MultiListRootPath=Extra))\n",
        );
        assert!(matches!(
            result,
            Err(Error::UnknownMultiList { id: 4, .. })
        ));
    }

    #[test]
    fn test_banner_image_name() {
        let manifest =
            parse("[ModInfo]\nmodname = Banner\nbannerimagename = banner.png\n").unwrap();
        assert_eq!(manifest.banner_image.as_deref(), Some("banner.png"));
    }
}
