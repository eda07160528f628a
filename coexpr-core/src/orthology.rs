//! Hierarchical ortholog groups and cross-species gene mapping.

use std::collections::{BTreeMap, HashMap};

use crate::types::{CoexprError, GeneId, HogId, LifeHabit, SpeciesId};

/// One row of the ortholog table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrthologMember {
    pub hog: HogId,
    /// Finer ortholog-group ID within the HOG
    pub orthogroup: String,
    pub species: SpeciesId,
    pub gene: GeneId,
    pub life_habit: LifeHabit,
    /// Whether the gene belongs to the HOG's core membership
    pub core: bool,
}

/// Mapping HOG → member genes across species, with reverse lookups.
///
/// A HOG may hold several genes of the same species (paralogs). Each gene ID
/// belongs to exactly one species and one HOG.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::orthology::{OrthologMember, OrthologTable};
/// use coexpr_core::types::LifeHabit;
///
/// let member = |hog: &str, species: &str, gene: &str| OrthologMember {
///     hog: hog.into(),
///     orthogroup: "OG1".into(),
///     species: species.into(),
///     gene: gene.into(),
///     life_habit: LifeHabit::Annual,
///     core: true,
/// };
/// let table = OrthologTable::new(vec![
///     member("HOG1", "A", "a1"),
///     member("HOG1", "B", "b1"),
///     member("HOG1", "B", "b2"),
/// ])?;
///
/// assert_eq!(table.orthologs_in("a1", "B"), vec!["b1", "b2"]);
/// assert_eq!(table.hog_of("b2"), Some("HOG1"));
/// # Ok::<(), coexpr_core::types::CoexprError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrthologTable {
    members: Vec<OrthologMember>,
    by_hog: BTreeMap<HogId, Vec<usize>>,
    by_gene: HashMap<GeneId, usize>,
    habits: BTreeMap<SpeciesId, LifeHabit>,
}

impl OrthologTable {
    /// Index the given rows.
    ///
    /// Species life habits are taken from the first row of each species that
    /// carries a recognised tag.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::ParseError`] if a gene ID is listed under two
    /// species or two HOGs.
    pub fn new(members: Vec<OrthologMember>) -> Result<Self, CoexprError> {
        let mut by_hog: BTreeMap<HogId, Vec<usize>> = BTreeMap::new();
        let mut by_gene = HashMap::with_capacity(members.len());
        let mut habits = BTreeMap::new();

        for (index, member) in members.iter().enumerate() {
            if let Some(&previous) = by_gene.get(&member.gene) {
                let previous: &OrthologMember = &members[previous];
                if previous.species != member.species || previous.hog != member.hog {
                    return Err(CoexprError::ParseError(format!(
                        "gene {} listed as {}/{} and {}/{}",
                        member.gene, previous.hog, previous.species, member.hog, member.species
                    )));
                }
                continue;
            }
            by_gene.insert(member.gene.clone(), index);
            by_hog.entry(member.hog.clone()).or_default().push(index);

            let habit = habits
                .entry(member.species.clone())
                .or_insert(LifeHabit::Unknown);
            if *habit == LifeHabit::Unknown {
                *habit = member.life_habit;
            }
        }

        Ok(Self {
            members,
            by_hog,
            by_gene,
            habits,
        })
    }

    /// Drop every row not flagged as core membership.
    ///
    /// # Errors
    ///
    /// Propagates [`OrthologTable::new`] errors.
    pub fn core_only(&self) -> Result<Self, CoexprError> {
        let members = self
            .members
            .iter()
            .filter(|member| member.core)
            .cloned()
            .collect();
        let mut table = Self::new(members)?;
        // Habits are a species property; keep tags seen on non-core rows too.
        table.merge_habits(&self.habits);
        Ok(table)
    }

    /// Fill in life habits for species whose ortholog rows carry no tag
    pub fn merge_habits<'a, I>(&mut self, habits: I)
    where
        I: IntoIterator<Item = (&'a SpeciesId, &'a LifeHabit)>,
    {
        for (species, habit) in habits {
            let entry = self
                .habits
                .entry(species.clone())
                .or_insert(LifeHabit::Unknown);
            if *entry == LifeHabit::Unknown {
                *entry = *habit;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_gene.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_gene.is_empty()
    }

    #[must_use]
    pub fn member(&self, gene: &str) -> Option<&OrthologMember> {
        self.by_gene.get(gene).map(|&index| &self.members[index])
    }

    #[must_use]
    pub fn hog_of(&self, gene: &str) -> Option<&str> {
        self.member(gene).map(|member| member.hog.as_str())
    }

    #[must_use]
    pub fn species_of(&self, gene: &str) -> Option<&str> {
        self.member(gene).map(|member| member.species.as_str())
    }

    /// Life habit of a species, `Unknown` if never tagged
    #[must_use]
    pub fn life_habit(&self, species: &str) -> LifeHabit {
        self.habits.get(species).copied().unwrap_or_default()
    }

    /// All HOG IDs in sorted order
    pub fn hogs(&self) -> impl Iterator<Item = &str> {
        self.by_hog.keys().map(String::as_str)
    }

    /// Members of one HOG, in table order
    pub fn hog_members<'a>(&'a self, hog: &str) -> impl Iterator<Item = &'a OrthologMember> {
        self.by_hog
            .get(hog)
            .into_iter()
            .flatten()
            .map(|&index| &self.members[index])
    }

    /// Genes of `target_species` sharing a HOG with `gene` (paralogs included).
    ///
    /// Returns an empty list for unknown genes.
    #[must_use]
    pub fn orthologs_in(&self, gene: &str, target_species: &str) -> Vec<&str> {
        let Some(member) = self.member(gene) else {
            return Vec::new();
        };
        self.hog_members(&member.hog)
            .filter(|other| other.species == target_species && other.gene != member.gene)
            .map(|other| other.gene.as_str())
            .collect()
    }
}
