use crate::communicator::{Communicator, Element, Rank};
use crate::error::{CommError, GatherError};
use crate::topology::RelationTree;
use tracing::debug;

/// Gathers variable sized chunks at `root` over the binary relation tree
///
/// Every rank passes its own chunk and the same `sizes` table, where
/// `sizes[r]` is the length of rank `r`'s chunk. The root gets back the
/// concatenation of all chunks in rank order, every other rank gets `None`.
///
/// A node forwards its subtree's chunks sorted by heap index: its own chunk,
/// then each child's chunk, then the chunks of deeper descendants. Children
/// are drained one after the other, left first, before anything moves up.
///
/// # Arguments
/// * `comm` the process group
/// * `root` rank receiving the gathered buffer
/// * `input` this rank's chunk, exactly `sizes[comm.rank()]` elements
/// * `sizes` chunk length of every rank
pub fn tree_gather_varcount<C, T>(
    comm: &C,
    root: Rank,
    input: &[T],
    sizes: &[usize],
) -> Result<Option<Vec<T>>, GatherError>
where
    C: Communicator,
    T: Element,
{
    let rank = comm.rank();
    let size = comm.size();
    comm.check_rank(root)?;
    if sizes.len() != size {
        return Err(GatherError::SizesLength {
            expected: size,
            actual: sizes.len(),
        });
    }
    if input.len() != sizes[rank] {
        return Err(GatherError::InputLength {
            rank,
            expected: sizes[rank],
            actual: input.len(),
        });
    }

    let tree = RelationTree::new(root, size);
    let links = tree.links(rank);
    let mut gathered = input.to_vec();

    // each child's own chunk goes straight after ours, the rest waits
    let mut forwarded: Vec<(Rank, Vec<T>)> = Vec::with_capacity(2);
    for child in links.children() {
        let payload = receive_payload(comm, child)?;
        let expected: usize = tree.subtree(child).iter().map(|&r| sizes[r]).sum();
        if payload.len() != expected {
            return Err(GatherError::PayloadLength {
                child,
                expected,
                actual: payload.len(),
            });
        }
        gathered.extend_from_slice(&payload[..sizes[child]]);
        forwarded.push((child, payload));
    }

    // cut the deferred remainders into per rank chunks and merge them by heap index
    let mut deferred: Vec<(usize, &[T])> = Vec::new();
    for (child, payload) in &forwarded {
        let mut offset = sizes[*child];
        for descendant in tree.subtree(*child).into_iter().skip(1) {
            let len = sizes[descendant];
            deferred.push((tree.relative(descendant), &payload[offset..offset + len]));
            offset += len;
        }
    }
    deferred.sort_by_key(|&(relative, _)| relative);
    for (_, chunk) in deferred {
        gathered.extend_from_slice(chunk);
    }

    match links.parent {
        Some(parent) => {
            send_payload(comm, parent, &gathered)?;
            debug!(rank, parent, len = gathered.len(), "forwarded subtree");
            Ok(None)
        }
        None => {
            // heap order starts at the root, rank order starts at rank 0
            let wrapped: usize = sizes[root..].iter().sum();
            gathered.rotate_left(wrapped);
            debug!(rank, len = gathered.len(), "gather complete");
            Ok(Some(gathered))
        }
    }
}

/// Root side of the tree gather, writes the gathered buffer into `output`
pub fn tree_gather_into_root<C, T>(
    comm: &C,
    input: &[T],
    output: &mut [T],
    sizes: &[usize],
) -> Result<(), GatherError>
where
    C: Communicator,
    T: Element,
{
    let gathered = tree_gather_varcount(comm, comm.rank(), input, sizes)?.unwrap_or_default();
    if gathered.len() != output.len() {
        return Err(GatherError::OutputLength {
            expected: gathered.len(),
            actual: output.len(),
        });
    }
    output.copy_from_slice(&gathered);
    Ok(())
}

/// Non root side of the tree gather
pub fn tree_gather_into<C, T>(
    comm: &C,
    root: Rank,
    input: &[T],
    sizes: &[usize],
) -> Result<(), GatherError>
where
    C: Communicator,
    T: Element,
{
    if comm.rank() == root {
        return Err(GatherError::RootRole { rank: root });
    }
    tree_gather_varcount(comm, root, input, sizes).map(|_| ())
}

/// length header followed by the elements
fn send_payload<C, T>(comm: &C, dest: Rank, payload: &[T]) -> Result<(), CommError>
where
    C: Communicator,
    T: Element,
{
    let header = [payload.len() as u64];
    comm.send(dest, &header[..])?;
    comm.send(dest, payload)
}

fn receive_payload<C, T>(comm: &C, source: Rank) -> Result<Vec<T>, GatherError>
where
    C: Communicator,
    T: Element,
{
    let mut header = [0u64; 1];
    comm.receive_into(source, &mut header[..])?;
    let mut payload = vec![T::default(); header[0] as usize];
    comm.receive_into(source, &mut payload[..])?;
    Ok(payload)
}
