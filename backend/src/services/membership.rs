//! Membership transfers between the shift groups of a course.

use log::{info, warn};

use super::error::{ShiftError, ShiftResult};
use super::shift_groups::get_shift_group;
use crate::db::repository::FullRepository;
use crate::models::{CourseKey, Membership, MembershipSwap, ShiftGroup, ShiftGroupId, UserId};

const NO_GROUP: &str = "None";

async fn group_label<R: FullRepository + ?Sized>(
    repo: &R,
    id: Option<ShiftGroupId>,
) -> ShiftResult<String> {
    Ok(match id {
        None => NO_GROUP.to_string(),
        Some(id) => match repo.get_shift_group(id).await? {
            Some(group) => group.name,
            None => id.to_string(),
        },
    })
}

/// Move `user` from `from_group` to `to_group`.
///
/// `None` on either side stands for "no membership": `from_group = None`
/// adds a first membership, `to_group = None` removes it. The comparison
/// with the stored membership and the write happen in one repository call,
/// so a rejected transfer leaves the membership untouched.
pub async fn transfer_user<R: FullRepository + ?Sized>(
    repo: &R,
    user: &UserId,
    from_group: Option<ShiftGroupId>,
    to_group: Option<ShiftGroupId>,
) -> ShiftResult<Option<Membership>> {
    let from = match from_group {
        Some(id) => Some(get_shift_group(repo, id).await?),
        None => None,
    };
    let to = match to_group {
        Some(id) => Some(get_shift_group(repo, id).await?),
        None => None,
    };

    let course_key = match (&from, &to) {
        (None, None) => {
            return Err(ShiftError::validation(
                "Transfer needs a source or a target shift group",
            ))
        }
        (Some(f), Some(t)) if f.course_key != t.course_key => {
            return Err(ShiftError::CourseMismatch {
                from: f.course_key.to_string(),
                to: t.course_key.to_string(),
            });
        }
        (Some(g), _) | (None, Some(g)) => g.course_key.clone(),
    };

    match repo
        .swap_membership(user, &course_key, from_group, to_group)
        .await?
    {
        MembershipSwap::Swapped(membership) => {
            info!(
                "Moved user {} in course {}: {} -> {}",
                user,
                course_key,
                from.as_ref().map_or(NO_GROUP, |g| g.name.as_str()),
                to.as_ref().map_or(NO_GROUP, |g| g.name.as_str()),
            );
            Ok(membership)
        }
        MembershipSwap::Conflict { actual } => {
            let actual = group_label(repo, actual).await?;
            let expected = from.map_or_else(|| NO_GROUP.to_string(), |g| g.name);
            warn!(
                "Rejected transfer of user {} in course {}: membership is '{}', not '{}'",
                user, course_key, actual, expected
            );
            Err(ShiftError::MembershipMismatch { actual, expected })
        }
    }
}

pub async fn get_user_membership<R: FullRepository + ?Sized>(
    repo: &R,
    user: &UserId,
    course_key: &CourseKey,
) -> ShiftResult<Option<Membership>> {
    Ok(repo.find_membership(user, course_key).await?)
}

/// The shift group the user belongs to in the course, if any.
pub async fn get_user_shift<R: FullRepository + ?Sized>(
    repo: &R,
    user: &UserId,
    course_key: &CourseKey,
) -> ShiftResult<Option<ShiftGroup>> {
    match repo.find_membership(user, course_key).await? {
        Some(membership) => Ok(repo.get_shift_group(membership.shift_group_id).await?),
        None => Ok(None),
    }
}
